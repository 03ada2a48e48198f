//! Model package loading
//!
//! A model package is a directory holding the recognizer's immutable
//! resources: a JSON config, a tokenizer vocabulary and optionally a binary
//! decoding graph. Loaded packages are shared across recognizer instances.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::fst::Fst;
use crate::stt::Tokenizer;
use trellis_config::{load_settings, Settings};
use trellis_core::{Error, Result};

/// Immutable resources shared by all recognizer sessions.
#[derive(Debug, Clone)]
pub struct SttModel {
    pub settings: Settings,
    pub tokenizer: Arc<Tokenizer>,
    pub graph: Arc<Fst>,
}

impl SttModel {
    /// Load a package from its JSON config file. Resource paths inside the
    /// config are resolved relative to the config file's directory. When no
    /// graph path is configured, the token topology T is built from the
    /// tokenizer.
    pub fn load(config_path: &Path) -> Result<Self> {
        let settings = load_settings(Some(config_path))
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;

        let base = config_path.parent().unwrap_or_else(|| Path::new("."));

        tracing::info!(path = %config_path.display(), "loading model package");
        let tokenizer = Arc::new(Tokenizer::load(&base.join(&settings.stt.tokenizer))?);

        let mut graph = Fst::new();
        if settings.stt.graph.is_empty() {
            graph.build_token_topology(&tokenizer)?;
        } else {
            let file = File::open(base.join(&settings.stt.graph))?;
            graph.load(&mut BufReader::new(file))?;
        }

        Ok(Self {
            settings,
            tokenizer,
            graph: Arc::new(graph),
        })
    }

    /// Assemble a package from already-loaded parts.
    pub fn from_parts(settings: Settings, tokenizer: Arc<Tokenizer>, graph: Arc<Fst>) -> Self {
        Self {
            settings,
            tokenizer,
            graph,
        }
    }
}
