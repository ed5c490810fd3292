//! Vector index abstraction for Vidask.
//!
//! Indexes are filled once by a builder and then frozen; the frozen index is
//! only reachable through read-only lookups, so it can be shared across any
//! number of concurrent requests without locking.

mod memory;

pub use memory::{MemoryIndexBuilder, MemoryVectorStore};

use crate::chunking::TranscriptChunk;
use crate::error::Result;
use async_trait::async_trait;

/// A chunk together with its embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub vector: Vec<f32>,
    pub chunk: TranscriptChunk,
}

impl EmbeddedChunk {
    pub fn new(vector: Vec<f32>, chunk: TranscriptChunk) -> Self {
        Self { vector, chunk }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    /// The matched chunk.
    pub chunk: TranscriptChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Read-only interface of a built index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The `k` most similar chunks, best first; ties keep insertion order.
    ///
    /// Returns `min(k, len)` results. An empty index yields no results.
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>>;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared dimensionality of stored vectors, if any are stored.
    fn dimensions(&self) -> Option<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
