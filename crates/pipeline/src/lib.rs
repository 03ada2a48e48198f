//! Streaming speech recognition pipeline
//!
//! This crate provides the decoding core and its streaming façade:
//! - Slab allocator feeding the decoder's per-frame token churn
//! - Arc-sorted FST decoding graphs with binary/text codecs
//! - Deterministic language models for on-the-fly shallow fusion
//! - Token-passing beam search over the (time, state) trellis
//! - Speech-to-text façade composing features, scorer and decoder

pub mod allocator;
pub mod fst;
pub mod lm;
pub mod search;
pub mod stt;

pub use allocator::SlabAllocator;
pub use fst::{Fst, FstArc, FstLabel, FstScore, FstState, FstStateId, EPSILON, INPUT_END};
pub use lm::{LanguageModel, LmScore, LmStateId, PrefixTreeLm, MAX_LM};
pub use search::{BeamSearch, StateHandle};
pub use stt::{
    AcousticScorer, FeatureExtractor, FrameChunker, PassthroughScorer, SpeechToText, SttModel,
    TokenId, Tokenizer,
};
