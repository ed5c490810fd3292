//! Transcript sources.
//!
//! A source supplies the ordered transcript records that the index is built
//! from. Sources are consulted once, at startup, before any question is
//! answered.

mod local;
pub mod vtt;
mod youtube;

pub use local::FileSource;
pub use youtube::YoutubeSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a transcript came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source identifier (video ID or file path).
    pub source: String,
    /// Human-readable title.
    pub title: String,
}

/// One transcript document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub text: String,
    pub metadata: SourceMetadata,
}

impl TranscriptRecord {
    pub fn new(text: impl Into<String>, source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: SourceMetadata {
                source: source.into(),
                title: title.into(),
            },
        }
    }
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Short label for logs.
    fn describe(&self) -> String;

    /// Load all transcript records, in source order.
    async fn load(&self) -> Result<Vec<TranscriptRecord>>;
}

/// In-memory source, used when the transcript text is already at hand.
pub struct StaticSource {
    records: Vec<TranscriptRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<TranscriptRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl TranscriptSource for StaticSource {
    fn describe(&self) -> String {
        format!("{} in-memory record(s)", self.records.len())
    }

    async fn load(&self) -> Result<Vec<TranscriptRecord>> {
        Ok(self.records.clone())
    }
}

/// Detect the appropriate transcript source for the given input.
///
/// YouTube URLs and bare video IDs win; anything else is treated as a path.
pub fn detect_source(input: &str, language: &str) -> Box<dyn TranscriptSource> {
    match YoutubeSource::parse(input, language) {
        Some(youtube) => Box::new(youtube),
        None => Box::new(FileSource::new(input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_source() {
        let source = detect_source("https://www.youtube.com/watch?v=e-gwvmhyU7A", "en");
        assert_eq!(source.describe(), "YouTube video e-gwvmhyU7A");

        let source = detect_source("./talk.txt", "en");
        assert_eq!(source.describe(), "file ./talk.txt");
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::new(vec![TranscriptRecord::new("hello", "mem", "Greeting")]);
        let records = source.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata.title, "Greeting");
    }
}
