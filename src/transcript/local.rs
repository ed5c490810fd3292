//! Local transcript files.
//!
//! Plain text is used as-is; `.vtt` caption files are converted to text first.

use super::vtt::vtt_to_text;
use super::{TranscriptRecord, TranscriptSource};
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Transcript stored in a local file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: PathBuf::from(shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string()),
        }
    }

    fn is_vtt(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("vtt"))
            .unwrap_or(false)
    }

    fn title(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string()
    }
}

#[async_trait]
impl TranscriptSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn load(&self) -> Result<Vec<TranscriptRecord>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            VidaskError::TranscriptSource(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let text = if self.is_vtt() { vtt_to_text(&raw) } else { raw };
        info!("Loaded transcript from {} ({} chars)", self.path.display(), text.len());

        Ok(vec![TranscriptRecord::new(
            text,
            self.path.display().to_string(),
            self.title(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("river-talk.txt");
        std::fs::write(&path, "The Nile is long.\nThe Amazon is wide.").unwrap();

        let records = FileSource::new(&path).load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata.title, "river-talk");
        assert_eq!(records[0].text, "The Nile is long.\nThe Amazon is wide.");
    }

    #[tokio::test]
    async fn test_load_vtt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.vtt");
        std::fs::write(&path, "WEBVTT\n\n00:00.000 --> 00:01.000\nHello there\n").unwrap();

        let records = FileSource::new(&path).load().await.unwrap();
        assert_eq!(records[0].text, "Hello there");
    }

    #[tokio::test]
    async fn test_missing_file_is_source_error() {
        let err = FileSource::new("/definitely/not/here.txt").load().await.unwrap_err();
        assert!(matches!(err, VidaskError::TranscriptSource(_)));
    }
}
