//! Tokenizer vocabulary
//!
//! Maps between subword token ids and strings and exposes the four special
//! symbols the decoder and graph builder rely on: blank, unknown,
//! begin-of-sentence and end-of-sentence.
//!
//! Supported on-disk formats:
//! - plain text, one token per line
//! - SentencePiece `.vocab` TSV (`token\tscore`)
//! - JSON map (`{"token": id, ...}`)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use trellis_core::{Error, Result};

pub type TokenId = i32;

/// Subword tokenizer vocabulary.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    tokens: Vec<String>,
    token_to_id: HashMap<String, TokenId>,

    pub blk: TokenId,
    pub unk: TokenId,
    pub bos: TokenId,
    pub eos: TokenId,
}

impl Tokenizer {
    /// Build from an ordered token list, resolving the special symbols by
    /// their conventional spellings (with fixed-position fallbacks).
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let token_to_id: HashMap<String, TokenId> = tokens
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as TokenId))
            .collect();

        let blk = token_to_id
            .get("<blk>")
            .or_else(|| token_to_id.get("<blank>"))
            .or_else(|| token_to_id.get("<pad>"))
            .copied()
            .unwrap_or(0);

        let unk = token_to_id
            .get("<unk>")
            .or_else(|| token_to_id.get("[UNK]"))
            .copied()
            .unwrap_or(1);

        let bos = token_to_id
            .get("<s>")
            .or_else(|| token_to_id.get("<bos>"))
            .copied()
            .unwrap_or(2);

        let eos = token_to_id
            .get("</s>")
            .or_else(|| token_to_id.get("<eos>"))
            .copied()
            .unwrap_or(3);

        Self {
            tokens,
            token_to_id,
            blk,
            unk,
            bos,
            eos,
        }
    }

    /// Load a vocabulary file. JSON maps are detected by extension; anything
    /// else is read line by line, taking the first tab-separated field so
    /// SentencePiece `.vocab` files work unchanged.
    pub fn load(path: &Path) -> Result<Self> {
        if path.extension().is_some_and(|e| e == "json") {
            return Self::load_json(path);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut tokens = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let token = line.split('\t').next().unwrap_or(&line);
            tokens.push(token.to_string());
        }

        if tokens.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "empty vocabulary: {}",
                path.display()
            )));
        }

        tracing::info!(size = tokens.len(), path = %path.display(), "tokenizer loaded");
        Ok(Self::from_tokens(tokens))
    }

    fn load_json(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let vocab_map: HashMap<String, TokenId> = serde_json::from_reader(file)
            .map_err(|e| Error::InvalidArgument(format!("bad vocab json: {}", e)))?;

        let mut pairs: Vec<_> = vocab_map.into_iter().collect();
        pairs.sort_by_key(|(_, id)| *id);

        let tokens: Vec<String> = pairs.into_iter().map(|(token, _)| token).collect();
        if tokens.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "empty vocabulary: {}",
                path.display()
            )));
        }
        Ok(Self::from_tokens(tokens))
    }

    pub fn size(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, id: TokenId) -> Option<&str> {
        self.tokens.get(id as usize).map(|s| s.as_str())
    }

    pub fn id(&self, token: &str) -> Option<TokenId> {
        self.token_to_id.get(token).copied()
    }

    /// True for blank, unknown, bos and eos.
    pub fn is_special(&self, id: TokenId) -> bool {
        id == self.blk || id == self.unk || id == self.bos || id == self.eos
    }
}
