//! Feature extraction contract
//!
//! Real frontends (filterbanks, CMVN, subsampling) are external
//! collaborators; the decoder pipeline only relies on this push/pop contract.
//! `FrameChunker` is the minimal shipped implementation: it slices an
//! incoming sample stream into fixed-dimension frames without transforming
//! them, which is exactly what is needed when scores are computed upstream.

use std::collections::VecDeque;

use trellis_core::{Error, Result};

/// Streaming feature source: samples in, fixed-dimension frames out.
pub trait FeatureExtractor: Send {
    /// Accept a chunk of audio samples.
    fn push(&mut self, samples: &[f32], sample_rate: f32) -> Result<()>;

    /// Signal end of stream; any partial frame is finalized or dropped.
    fn push_eos(&mut self);

    /// Number of frames ready to pop.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pop the oldest ready frame.
    fn pop(&mut self) -> Option<Vec<f32>>;

    /// Frame dimension.
    fn dim(&self) -> usize;

    /// Drop all buffered state.
    fn reset(&mut self);
}

/// Groups an incoming sample stream into `dim`-sized frames.
#[derive(Debug)]
pub struct FrameChunker {
    dim: usize,
    buffer: Vec<f32>,
    ready: VecDeque<Vec<f32>>,
}

impl FrameChunker {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            buffer: Vec::new(),
            ready: VecDeque::new(),
        }
    }
}

impl FeatureExtractor for FrameChunker {
    fn push(&mut self, samples: &[f32], _sample_rate: f32) -> Result<()> {
        if samples.is_empty() {
            return Err(Error::InvalidArgument("empty sample chunk".to_string()));
        }
        self.buffer.extend_from_slice(samples);

        while self.buffer.len() >= self.dim {
            let frame: Vec<f32> = self.buffer.drain(..self.dim).collect();
            self.ready.push_back(frame);
        }
        Ok(())
    }

    fn push_eos(&mut self) {
        if !self.buffer.is_empty() {
            tracing::debug!(
                leftover = self.buffer.len(),
                "dropping partial frame at end of stream"
            );
            self.buffer.clear();
        }
    }

    fn len(&self) -> usize {
        self.ready.len()
    }

    fn pop(&mut self) -> Option<Vec<f32>> {
        self.ready.pop_front()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.ready.clear();
    }
}
