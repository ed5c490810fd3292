//! Transcript chunking.
//!
//! Splits transcript records into overlapping, token-bounded chunks that are
//! embedded and indexed once at startup.

mod recursive;

pub use recursive::{default_separators, ChunkSpan, RecursiveSplitter};

use crate::error::Result;
use crate::tokenizer::LengthFunction;
use crate::transcript::TranscriptRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Where a chunk sits in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source identifier (video ID or file path).
    pub source: String,
    /// Transcript title.
    pub title: String,
    /// Order of this chunk across the whole transcript.
    pub position: usize,
}

/// A chunk of transcript text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl TranscriptChunk {
    pub fn new(text: impl Into<String>, source: &str, title: &str, position: usize) -> Self {
        Self {
            text: text.into(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                title: title.to_string(),
                position,
            },
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk length, in length-metric units.
    pub max_size: usize,
    /// Length of the tail repeated at the start of the next chunk.
    pub overlap: usize,
    /// Separators, most meaningful first.
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_size: 2000,
            overlap: 100,
            separators: default_separators(),
        }
    }
}

/// Turns transcript records into ordered chunks.
pub struct TranscriptChunker {
    splitter: RecursiveSplitter,
}

impl TranscriptChunker {
    pub fn new(splitter: RecursiveSplitter) -> Self {
        Self { splitter }
    }

    pub fn from_config(config: &ChunkingConfig, length: Arc<dyn LengthFunction>) -> Result<Self> {
        let splitter = RecursiveSplitter::new(
            config.max_size,
            config.overlap,
            config.separators.clone(),
            length,
        )?;
        Ok(Self::new(splitter))
    }

    pub fn splitter(&self) -> &RecursiveSplitter {
        &self.splitter
    }

    /// Chunk every record, numbering chunks in source order.
    pub fn chunk(&self, records: &[TranscriptRecord]) -> Vec<TranscriptChunk> {
        let mut chunks = Vec::new();

        for record in records {
            let before = chunks.len();
            for text in self.splitter.split(&record.text) {
                if text.trim().is_empty() {
                    continue;
                }
                let position = chunks.len();
                chunks.push(TranscriptChunk::new(
                    text,
                    &record.metadata.source,
                    &record.metadata.title,
                    position,
                ));
            }
            debug!(
                "Split '{}' into {} chunks",
                record.metadata.title,
                chunks.len() - before
            );
        }

        chunks
    }
}
