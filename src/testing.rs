//! Deterministic stand-ins for the network services, for offline tests.

use crate::completion::CompletionClient;
use crate::embedding::Embedder;
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Bag-of-words embedder: each lowercase word is hashed (FNV-1a) into one of
/// `dimensions` buckets.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        "hashing-bow"
    }
}

/// Embedder whose calls fail, either always or only for single queries.
pub struct FailingEmbedder {
    inner: HashingEmbedder,
    fail_batch: bool,
}

impl FailingEmbedder {
    pub fn always() -> Self {
        Self {
            inner: HashingEmbedder::new(16),
            fail_batch: true,
        }
    }

    /// Indexing works, query embedding fails.
    pub fn on_query() -> Self {
        Self {
            inner: HashingEmbedder::new(16),
            fail_batch: false,
        }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(VidaskError::EmbeddingService("service unavailable".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.fail_batch {
            return Err(VidaskError::EmbeddingService("service unavailable".to_string()));
        }
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model(&self) -> &str {
        "failing"
    }
}

/// Arguments of one completion call.
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Completion client returning a fixed answer and recording every call.
pub struct RecordingCompletion {
    answer: String,
    calls: Mutex<Vec<CompletionCall>>,
}

impl RecordingCompletion {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for RecordingCompletion {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(CompletionCall {
            system: system.to_string(),
            user: user.to_string(),
            max_tokens,
            temperature,
        });
        Ok(self.answer.clone())
    }

    fn model(&self) -> &str {
        "recording"
    }
}

pub struct FailingCompletion;

#[async_trait]
impl CompletionClient for FailingCompletion {
    async fn complete(&self, _: &str, _: &str, _: u32, _: f32) -> Result<String> {
        Err(VidaskError::Generation("model overloaded".to_string()))
    }

    fn model(&self) -> &str {
        "failing"
    }
}

/// Completion client that answers only after `delay`.
pub struct SlowCompletion {
    delay: Duration,
}

impl SlowCompletion {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CompletionClient for SlowCompletion {
    async fn complete(&self, _: &str, _: &str, _: u32, _: f32) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok("late".to_string())
    }

    fn model(&self) -> &str {
        "slow"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embed_matches_embed_batch() {
        let embedder = HashingEmbedder::new(64);
        let texts = vec!["Paris is the capital of France.".to_string(), "".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(&embedder.embed(text).await.unwrap(), vector);
        }
    }
}
