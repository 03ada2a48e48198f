//! Streaming speech-to-text façade
//!
//! Composes the feature extractor, the acoustic scorer and the beam-search
//! decoder into a push-based pipeline:
//!
//! samples -> features -> log-posterior frames -> decoder -> token ids -> text
//!
//! Audio is consumed synchronously; the caller controls pacing. On end of
//! stream an EOS marker cascades through all three stages before the n-best
//! result is read back.

mod features;
mod model;
mod scorer;
mod vocab;

pub use features::{FeatureExtractor, FrameChunker};
pub use model::SttModel;
pub use scorer::{AcousticScorer, PassthroughScorer};
pub use vocab::{TokenId, Tokenizer};

use std::sync::Arc;

use crate::search::BeamSearch;
use trellis_core::{Error, Result};

const DEFAULT_SESSION: &str = "default_session";

/// Streaming recognizer for one utterance at a time.
pub struct SpeechToText {
    tokenizer: Arc<Tokenizer>,
    features: Box<dyn FeatureExtractor>,
    scorer: Box<dyn AcousticScorer>,
    search: BeamSearch,
}

impl SpeechToText {
    /// Build a recognizer from a loaded model package, wiring the shipped
    /// passthrough frontend (frame dim = tokenizer size).
    pub fn from_model(model: &SttModel) -> Result<Self> {
        let dim = model.tokenizer.size();
        Self::with_components(
            Arc::clone(&model.tokenizer),
            Box::new(FrameChunker::new(dim)),
            Box::new(PassthroughScorer::new(dim)),
            BeamSearch::new(
                model.settings.beam_search.clone(),
                Arc::clone(&model.graph),
                Arc::clone(&model.tokenizer),
            )?,
        )
    }

    /// Build a recognizer from explicit components; deployments plug their
    /// own frontend and scorer here.
    pub fn with_components(
        tokenizer: Arc<Tokenizer>,
        features: Box<dyn FeatureExtractor>,
        scorer: Box<dyn AcousticScorer>,
        mut search: BeamSearch,
    ) -> Result<Self> {
        search.init_session(DEFAULT_SESSION)?;
        Ok(Self {
            tokenizer,
            features,
            scorer,
            search,
        })
    }

    /// Feed a chunk of audio samples.
    pub fn speech(&mut self, samples: &[f32], sample_rate: f32) -> Result<()> {
        if samples.is_empty() {
            return Err(Error::InvalidArgument("empty audio chunk".to_string()));
        }
        self.advance(Some((samples, sample_rate)), false)
    }

    /// Flush the pipeline: cascade end-of-stream through features, scorer
    /// and decoder, producing the n-best result.
    pub fn to(&mut self) -> Result<()> {
        self.advance(None, true)
    }

    /// Render the current n-best result. Each path concatenates its token
    /// strings with specials skipped and word boundaries spaced; paths are
    /// joined with tabs.
    pub fn text(&self) -> String {
        let mut paths = Vec::new();
        for path in self.search.n_best() {
            let mut line = String::new();
            for &id in path {
                if self.tokenizer.is_special(id) {
                    continue;
                }
                if let Some(piece) = self.tokenizer.token(id) {
                    line.push_str(&piece.replace('▁', " "));
                }
            }
            paths.push(line.trim().to_string());
        }
        paths.join("\t")
    }

    /// Raw n-best token-id paths.
    pub fn n_best(&self) -> &[Vec<TokenId>] {
        self.search.n_best()
    }

    /// Reset for the next utterance.
    pub fn clear(&mut self) -> Result<()> {
        self.features.reset();
        self.scorer.reset();
        self.search.deinit_session();
        self.search.init_session(DEFAULT_SESSION)
    }

    fn advance(&mut self, samples: Option<(&[f32], f32)>, eos: bool) -> Result<()> {
        if let Some((chunk, sample_rate)) = samples {
            self.features.push(chunk, sample_rate)?;
        }
        if eos {
            self.features.push_eos();
        }

        while let Some(frame) = self.features.pop() {
            self.scorer.push(frame)?;
        }
        if eos {
            self.scorer.push_eos();
        }

        while let Some(scores) = self.scorer.pop() {
            self.search.push(&scores)?;
        }
        if eos {
            self.search.push_eos()?;
        }

        Ok(())
    }
}
