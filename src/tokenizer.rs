//! Length metrics used to size transcript chunks.
//!
//! Chunk sizes are measured in model tokens rather than characters, so that a
//! chunk budget tracks what the language model will actually be charged for.
//! One [`TokenCounter`] instance is built per run and shared by every length
//! decision the chunker makes.

use crate::error::{Result, VidaskError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Measures text length in the units used for chunk budgets.
pub trait LengthFunction: Send + Sync {
    /// Length of `text`. Never fails; any string has a length.
    fn length(&self, text: &str) -> usize;
}

/// BPE vocabulary used for token counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    R50kBase,
    #[default]
    P50kBase,
    Cl100kBase,
    O200kBase,
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "r50k_base" | "gpt2" => Ok(Encoding::R50kBase),
            "p50k_base" => Ok(Encoding::P50kBase),
            "cl100k_base" => Ok(Encoding::Cl100kBase),
            "o200k_base" => Ok(Encoding::O200kBase),
            _ => Err(format!("Unknown encoding: {}", s)),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::R50kBase => write!(f, "r50k_base"),
            Encoding::P50kBase => write!(f, "p50k_base"),
            Encoding::Cl100kBase => write!(f, "cl100k_base"),
            Encoding::O200kBase => write!(f, "o200k_base"),
        }
    }
}

/// Token counter backed by a tiktoken BPE vocabulary.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
    encoding: Encoding,
}

impl TokenCounter {
    /// Load the vocabulary for `encoding`.
    pub fn new(encoding: Encoding) -> Result<Self> {
        let bpe = match encoding {
            Encoding::R50kBase => tiktoken_rs::r50k_base(),
            Encoding::P50kBase => tiktoken_rs::p50k_base(),
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            Encoding::O200kBase => tiktoken_rs::o200k_base(),
        }
        .map_err(|e| VidaskError::Config(format!("Failed to load {} vocabulary: {}", encoding, e)))?;

        Ok(Self {
            bpe: Arc::new(bpe),
            encoding,
        })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl LengthFunction for TokenCounter {
    fn length(&self, text: &str) -> usize {
        // Ordinary encoding: special-token markers such as "<|endoftext|>"
        // are counted as plain text instead of being rejected.
        self.bpe.encode_ordinary(text).len()
    }
}

/// Character count. Handy for previews and for reasoning about chunk shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCounter;

impl LengthFunction for CharCounter {
    fn length(&self, text: &str) -> usize {
        text.chars().count()
    }
}
