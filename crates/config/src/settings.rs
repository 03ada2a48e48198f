//! Main settings module

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Top-level application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Model resources and streaming parameters
    #[serde(default)]
    pub stt: SttConfig,

    /// Beam search decoder configuration
    #[serde(default)]
    pub beam_search: BeamSearchConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.beam_search.validate()?;
        Ok(())
    }
}

/// Speech-to-text resource configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Tokenizer vocabulary path, one token per line or SentencePiece TSV
    #[serde(default = "default_tokenizer_path")]
    pub tokenizer: String,

    /// Decoding graph path (binary FST). Empty means: build the token
    /// topology T from the tokenizer at load time.
    #[serde(default)]
    pub graph: String,
}

fn default_tokenizer_path() -> String {
    "tokenizer.vocab".to_string()
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            tokenizer: default_tokenizer_path(),
            graph: String::new(),
        }
    }
}

/// Beam search decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamSearchConfig {
    /// Per-frame diagnostic trace
    #[serde(default)]
    pub debug: bool,

    /// Log-score width below the running best at which hypotheses are pruned
    #[serde(default = "default_beam")]
    pub beam: f32,

    /// Cap on surviving token sets per frame (0 = no cap)
    #[serde(default = "default_max_active")]
    pub max_active: i32,

    /// Maximum tokens per token set (distinct LM contexts per state)
    #[serde(default = "default_token_set_size")]
    pub token_set_size: usize,

    /// Number of paths returned by the final traceback
    #[serde(default = "default_nbest")]
    pub nbest: usize,

    /// Subtracted from the total score on each word-end arc
    #[serde(default)]
    pub insertion_penalty: f32,

    /// Subtract the per-frame best score from running totals, keeping them
    /// in a bounded dynamic range over long audio
    #[serde(default = "default_true")]
    pub apply_score_offsets: bool,

    /// Records per slab in the token allocator
    #[serde(default = "default_slab_size")]
    pub token_allocator_slab_size: usize,
}

fn default_beam() -> f32 {
    16.0
}
fn default_max_active() -> i32 {
    12
}
fn default_token_set_size() -> usize {
    1
}
fn default_nbest() -> usize {
    1
}
fn default_slab_size() -> usize {
    4096
}
fn default_true() -> bool {
    true
}

impl Default for BeamSearchConfig {
    fn default() -> Self {
        Self {
            debug: false,
            beam: default_beam(),
            max_active: default_max_active(),
            token_set_size: default_token_set_size(),
            nbest: default_nbest(),
            insertion_penalty: 0.0,
            apply_score_offsets: default_true(),
            token_allocator_slab_size: default_slab_size(),
        }
    }
}

impl BeamSearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.beam <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "beam_search.beam".to_string(),
                message: "beam width must be positive".to_string(),
            });
        }
        if self.max_active < 0 {
            return Err(ConfigError::InvalidValue {
                field: "beam_search.max_active".to_string(),
                message: "must be >= 0 (0 disables the cap)".to_string(),
            });
        }
        if self.token_set_size < 1 {
            return Err(ConfigError::InvalidValue {
                field: "beam_search.token_set_size".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.nbest < 1 {
            return Err(ConfigError::InvalidValue {
                field: "beam_search.nbest".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.token_allocator_slab_size < 1 {
            return Err(ConfigError::InvalidValue {
                field: "beam_search.token_allocator_slab_size".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from a JSON file and the environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (TRELLIS__ prefix, `__` separator)
/// 2. The given JSON file
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(p) = path {
        if !p.exists() {
            return Err(ConfigError::FileNotFound(p.display().to_string()));
        }
        builder = builder.add_source(
            File::from(p)
                .format(FileFormat::Json)
                .required(true),
        );
    }

    builder = builder.add_source(
        Environment::with_prefix("TRELLIS")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;
    tracing::debug!(?settings, "settings loaded");

    Ok(settings)
}
