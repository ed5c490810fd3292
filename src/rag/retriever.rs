//! Retrieval over the transcript index.
//!
//! A [`Retriever`] owns the embedder that built its index, so every query is
//! embedded by the same model and configuration as the indexed chunks.

use crate::chunking::TranscriptChunk;
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{Result, VidaskError};
use crate::transcript::SourceMetadata;
use crate::vector_store::{EmbeddedChunk, MemoryIndexBuilder, RetrievalResult, VectorStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Summary of a built index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    /// Number of indexed chunks.
    pub chunks: usize,
    /// Vector dimensionality, if the index holds anything.
    pub dimensions: Option<usize>,
    /// Embedding model identity.
    pub embedding_model: String,
    /// Transcripts that contributed chunks, in source order.
    pub sources: Vec<SourceMetadata>,
    /// When the index was built.
    pub built_at: DateTime<Utc>,
}

/// Embeds queries and searches the frozen index.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    stats: IndexStats,
}

impl Retriever {
    /// Embed `chunks` in one batch and freeze them into an in-memory index.
    ///
    /// Any failure aborts the build; a partial index is never returned.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn build(
        embedder: Arc<dyn Embedder>,
        chunks: Vec<TranscriptChunk>,
        prompts: &Prompts,
    ) -> Result<Self> {
        let sources = distinct_sources(&chunks);

        let documents: Vec<String> = chunks.iter().map(|c| document_text(prompts, c)).collect();
        info!("Embedding {} chunks with {}", documents.len(), embedder.model());
        let vectors = embedder.embed_batch(&documents).await.map_err(into_embedding_error)?;

        if vectors.len() != chunks.len() {
            return Err(VidaskError::EmbeddingService(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let mut builder = MemoryIndexBuilder::new();
        builder.add(
            vectors
                .into_iter()
                .zip(chunks)
                .map(|(vector, chunk)| EmbeddedChunk::new(vector, chunk))
                .collect(),
        )?;
        let store = builder.freeze();

        let mut retriever = Self::from_parts(embedder, Arc::new(store))?;
        retriever.stats.sources = sources;
        info!(
            "Index ready: {} chunks, {:?} dimensions",
            retriever.stats.chunks, retriever.stats.dimensions
        );
        Ok(retriever)
    }

    /// Pair an embedder with an already built index.
    pub fn from_parts(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Result<Self> {
        if let Some(dims) = store.dimensions() {
            if dims != embedder.dimensions() {
                return Err(VidaskError::Retrieval(format!(
                    "Index holds {}-dimensional vectors but embedder {} produces {}",
                    dims,
                    embedder.model(),
                    embedder.dimensions()
                )));
            }
        }

        let stats = IndexStats {
            chunks: store.len(),
            dimensions: store.dimensions(),
            embedding_model: embedder.model().to_string(),
            sources: Vec::new(),
            built_at: Utc::now(),
        };

        Ok(Self {
            embedder,
            store,
            stats,
        })
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Embed a query with the index's embedder.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder.embed(query).await.map_err(into_embedding_error)
    }

    /// Nearest chunks to an embedded query.
    pub async fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        let results = self
            .store
            .search(query_embedding, k)
            .await
            .map_err(|e| match e {
                VidaskError::Retrieval(_) => e,
                other => VidaskError::Retrieval(other.to_string()),
            })?;
        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }

    /// Embed `query` and return its `k` nearest chunks.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        let vector = self.embed_query(query).await?;
        self.search(&vector, k).await
    }
}

/// Text handed to the embedder for a chunk: the chunk framed with its source.
pub fn document_text(prompts: &Prompts, chunk: &TranscriptChunk) -> String {
    let mut vars = HashMap::new();
    vars.insert("source".to_string(), chunk.metadata.source.clone());
    vars.insert("title".to_string(), chunk.metadata.title.clone());
    vars.insert("content".to_string(), chunk.text.clone());
    prompts.render_with_custom(&prompts.rag.document, &vars)
}

fn into_embedding_error(e: VidaskError) -> VidaskError {
    match e {
        VidaskError::EmbeddingService(_) => e,
        other => VidaskError::EmbeddingService(other.to_string()),
    }
}

fn distinct_sources(chunks: &[TranscriptChunk]) -> Vec<SourceMetadata> {
    let mut sources: Vec<SourceMetadata> = Vec::new();
    for chunk in chunks {
        let meta = SourceMetadata {
            source: chunk.metadata.source.clone(),
            title: chunk.metadata.title.clone(),
        };
        if !sources.contains(&meta) {
            sources.push(meta);
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, HashingEmbedder};

    fn chunks(texts: &[&str]) -> Vec<TranscriptChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscriptChunk::new(*t, "e-gwvmhyU7A", "Geography 101", i))
            .collect()
    }

    #[tokio::test]
    async fn test_top_match() {
        let embedder = Arc::new(HashingEmbedder::new(256));
        let retriever = Retriever::build(
            embedder,
            chunks(&["Paris is the capital of France.", "The Nile flows north through Egypt."]),
            &Prompts::default(),
        )
        .await
        .unwrap();

        let results = retriever.retrieve("What is the capital of France?", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "Paris is the capital of France.");

        let stats = retriever.stats();
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.dimensions, Some(256));
        assert_eq!(stats.sources.len(), 1);
        assert_eq!(stats.sources[0].title, "Geography 101");
    }

    #[tokio::test]
    async fn test_empty_index() {
        let retriever = Retriever::build(Arc::new(HashingEmbedder::new(32)), Vec::new(), &Prompts::default())
            .await
            .unwrap();
        assert!(retriever.is_empty());
        assert!(retriever.retrieve("anything", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_fails_when_embedding_fails() {
        let err = Retriever::build(
            Arc::new(FailingEmbedder::always()),
            chunks(&["some text"]),
            &Prompts::default(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, VidaskError::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn test_query_failure_is_not_zero_vector() {
        let retriever = Retriever::build(
            Arc::new(FailingEmbedder::on_query()),
            chunks(&["some text"]),
            &Prompts::default(),
        )
        .await
        .unwrap();
        let err = retriever.retrieve("question", 1).await.unwrap_err();
        assert!(matches!(err, VidaskError::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn test_from_parts_rejects_other_dimensions() {
        let mut builder = MemoryIndexBuilder::new();
        builder
            .add(vec![EmbeddedChunk::new(vec![1.0, 0.0], chunks(&["x"]).remove(0))])
            .unwrap();
        let store: Arc<dyn VectorStore> = Arc::new(builder.freeze());

        let err = Retriever::from_parts(Arc::new(HashingEmbedder::new(8)), store).err().unwrap();
        assert!(matches!(err, VidaskError::Retrieval(_)));
    }

    #[test]
    fn test_document_text_frames_chunk() {
        let chunk = TranscriptChunk::new("Hello", "abc", "Intro", 0);
        assert_eq!(
            document_text(&Prompts::default(), &chunk),
            "Source: abc, Title: Intro \n\nContent: Hello"
        );
    }
}
