//! Acoustic scorer contract
//!
//! The neural scorer is an external collaborator; the pipeline relies only
//! on this push/pop contract: feature frames in, one log-posterior vector
//! per frame out, indexed by token id.

use std::collections::VecDeque;

use trellis_core::{Error, Result};

/// Streaming acoustic scorer.
pub trait AcousticScorer: Send {
    /// Accept one feature frame.
    fn push(&mut self, frame: Vec<f32>) -> Result<()>;

    /// Signal end of stream.
    fn push_eos(&mut self);

    /// Number of score vectors ready to pop.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pop the oldest score vector (length = tokenizer size).
    fn pop(&mut self) -> Option<Vec<f32>>;

    /// Drop all buffered state.
    fn reset(&mut self);
}

/// Forwards frames unchanged, for setups where log-posteriors are computed
/// upstream and the "features" already are per-token scores.
#[derive(Debug)]
pub struct PassthroughScorer {
    vocab_size: usize,
    ready: VecDeque<Vec<f32>>,
}

impl PassthroughScorer {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            ready: VecDeque::new(),
        }
    }
}

impl AcousticScorer for PassthroughScorer {
    fn push(&mut self, frame: Vec<f32>) -> Result<()> {
        if frame.len() != self.vocab_size {
            return Err(Error::InvalidArgument(format!(
                "frame has {} entries, expected {}",
                frame.len(),
                self.vocab_size
            )));
        }
        self.ready.push_back(frame);
        Ok(())
    }

    fn push_eos(&mut self) {}

    fn len(&self) -> usize {
        self.ready.len()
    }

    fn pop(&mut self) -> Option<Vec<f32>> {
        self.ready.pop_front()
    }

    fn reset(&mut self) {
        self.ready.clear();
    }
}
