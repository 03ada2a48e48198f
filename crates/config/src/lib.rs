//! Configuration management for the trellis speech recognizer
//!
//! Supports loading configuration from:
//! - JSON files
//! - Environment variables (TRELLIS__ prefix)
//!
//! Dotted paths in the file map onto the typed fields below, e.g.
//! `beam_search.max_active` or `stt.tokenizer`.

pub mod settings;

pub use settings::{load_settings, BeamSearchConfig, Settings, SttConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
