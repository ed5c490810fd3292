//! In-memory vector index.
//!
//! [`MemoryIndexBuilder`] is the only mutable form; [`MemoryIndexBuilder::freeze`]
//! consumes it and returns a [`MemoryVectorStore`] that offers lookups only.

use super::{cosine_similarity, EmbeddedChunk, RetrievalResult, VectorStore};
use crate::error::{Result, VidaskError};
use async_trait::async_trait;

/// Collects entries before the index is frozen.
#[derive(Debug, Default)]
pub struct MemoryIndexBuilder {
    entries: Vec<EmbeddedChunk>,
    dimensions: Option<usize>,
}

impl MemoryIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries. No deduplication; all vectors must share one dimensionality.
    pub fn add(&mut self, entries: Vec<EmbeddedChunk>) -> Result<()> {
        let mut dimensions = self.dimensions;
        for entry in &entries {
            let dims = entry.vector.len();
            if dims == 0 {
                return Err(VidaskError::Retrieval(format!(
                    "Chunk {} has an empty embedding",
                    entry.chunk.metadata.position
                )));
            }
            match dimensions {
                Some(expected) if expected != dims => {
                    return Err(VidaskError::Retrieval(format!(
                        "Dimension mismatch: index holds {}-dimensional vectors, got {}",
                        expected, dims
                    )));
                }
                Some(_) => {}
                None => dimensions = Some(dims),
            }
        }

        self.dimensions = dimensions;
        self.entries.extend(entries);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish building. The returned index can no longer be modified.
    pub fn freeze(self) -> MemoryVectorStore {
        MemoryVectorStore {
            entries: self.entries,
            dimensions: self.dimensions,
        }
    }
}

/// Frozen in-memory vector index.
#[derive(Debug)]
pub struct MemoryVectorStore {
    entries: Vec<EmbeddedChunk>,
    dimensions: Option<usize>,
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(VidaskError::Retrieval("k must be at least 1".to_string()));
        }

        let Some(dimensions) = self.dimensions else {
            return Ok(Vec::new());
        };
        if query_embedding.len() != dimensions {
            return Err(VidaskError::Retrieval(format!(
                "Dimension mismatch: query has {} dimensions, index has {}",
                query_embedding.len(),
                dimensions
            )));
        }

        let mut results: Vec<RetrievalResult> = self
            .entries
            .iter()
            .map(|entry| RetrievalResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.vector),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TranscriptChunk;

    fn entry(text: &str, position: usize, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk::new(vector, TranscriptChunk::new(text, "video1", "Test Video", position))
    }

    fn store() -> MemoryVectorStore {
        let mut builder = MemoryIndexBuilder::new();
        builder
            .add(vec![
                entry("Hello world", 0, vec![1.0, 0.0, 0.0]),
                entry("Goodbye world", 1, vec![0.0, 1.0, 0.0]),
                entry("Hello again", 2, vec![0.9, 0.1, 0.0]),
            ])
            .unwrap();
        builder.freeze()
    }

    #[tokio::test]
    async fn test_search_orders_by_score() {
        let store = store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.dimensions(), Some(3));

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.text, "Hello world");
        assert_eq!(results[1].chunk.text, "Hello again");
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_search_returns_min_k_len() {
        let store = store();
        assert_eq!(store.search(&[0.0, 1.0, 0.0], 1).await.unwrap().len(), 1);
        assert_eq!(store.search(&[0.0, 1.0, 0.0], 2).await.unwrap().len(), 2);
        assert_eq!(store.search(&[0.0, 1.0, 0.0], 50).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let mut builder = MemoryIndexBuilder::new();
        builder
            .add(vec![
                entry("first", 0, vec![3.0, 4.0]),
                entry("second", 1, vec![6.0, 8.0]),
                entry("third", 2, vec![9.0, 12.0]),
            ])
            .unwrap();
        let store = builder.freeze();

        let results = store.search(&[3.0, 4.0], 3).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let store = MemoryIndexBuilder::new().freeze();
        assert!(store.is_empty());
        let results = store.search(&[0.3, 0.4], 1).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_dimension_mismatch() {
        let store = store();
        let err = store.search(&[1.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(err, VidaskError::Retrieval(_)));

        let mut builder = MemoryIndexBuilder::new();
        builder.add(vec![entry("a", 0, vec![1.0, 0.0])]).unwrap();
        assert!(builder.add(vec![entry("b", 1, vec![1.0, 0.0, 0.0])]).is_err());
        assert_eq!(builder.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_zero_k() {
        tokio_test::assert_err!(store().search(&[1.0, 0.0, 0.0], 0).await);
    }
}
