//! YouTube caption source.
//!
//! Captions and the video title are fetched with `yt-dlp`; no audio is
//! downloaded.

use super::vtt::vtt_to_text;
use super::{TranscriptRecord, TranscriptSource};
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::{debug, info, instrument};

fn video_id_regex() -> &'static Regex {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    VIDEO_ID.get_or_init(|| {
        // Matches various YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex")
    })
}

/// Extract video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = video_id_regex().captures(input.trim())?;

    // Try group 1 (URL format) then group 2 (bare ID)
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Captions of a single YouTube video.
pub struct YoutubeSource {
    video_id: String,
    language: String,
}

impl YoutubeSource {
    /// Build a source if `input` names a YouTube video.
    pub fn parse(input: &str, language: &str) -> Option<Self> {
        // Existing local files named like an 11-character ID stay files.
        if Path::new(input).exists() {
            return None;
        }
        extract_video_id(input).map(|video_id| Self {
            video_id,
            language: language.to_string(),
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    async fn run_ytdlp(args: &[&str]) -> Result<std::process::Output> {
        let output = Command::new("yt-dlp").args(args).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VidaskError::ToolNotFound("yt-dlp".to_string())
            } else {
                VidaskError::TranscriptSource(format!("Failed to run yt-dlp: {}", e))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidaskError::TranscriptSource(format!("yt-dlp failed: {}", stderr.trim())));
        }
        Ok(output)
    }

    /// Fetch the video title.
    async fn fetch_title(&self) -> Result<String> {
        let url = self.url();
        let output = Self::run_ytdlp(&["--dump-json", "--no-download", "--no-warnings", &url]).await?;

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            VidaskError::TranscriptSource(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        Ok(json["title"].as_str().unwrap_or("Unknown Title").to_string())
    }

    /// Download captions (manual first, automatic as fallback) as WebVTT.
    async fn fetch_captions(&self, dir: &Path) -> Result<PathBuf> {
        let url = self.url();
        let template = dir.join(format!("{}.%(ext)s", self.video_id));
        let template = template.to_string_lossy().to_string();

        Self::run_ytdlp(&[
            "--skip-download",
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            &self.language,
            "--sub-format",
            "vtt",
            "--no-warnings",
            "--quiet",
            "--output",
            &template,
            &url,
        ])
        .await?;

        find_caption_file(dir, &self.video_id)
    }
}

/// Locate the caption file yt-dlp wrote for `video_id`.
fn find_caption_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            name.starts_with(video_id) && name.ends_with(".vtt")
        })
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        VidaskError::TranscriptSource(format!("No captions available for video {}", video_id))
    })
}

#[async_trait]
impl TranscriptSource for YoutubeSource {
    fn describe(&self) -> String {
        format!("YouTube video {}", self.video_id)
    }

    #[instrument(skip(self), fields(video_id = %self.video_id))]
    async fn load(&self) -> Result<Vec<TranscriptRecord>> {
        info!("Fetching metadata for {}", self.video_id);
        let title = self.fetch_title().await?;

        let dir = tempfile::tempdir()?;
        let caption_path = self.fetch_captions(dir.path()).await?;
        debug!("Captions written to {}", caption_path.display());

        let vtt = tokio::fs::read_to_string(&caption_path).await?;
        let text = vtt_to_text(&vtt);
        if text.trim().is_empty() {
            return Err(VidaskError::TranscriptSource(format!(
                "Captions for video {} are empty",
                self.video_id
            )));
        }

        info!("Loaded transcript for '{}' ({} chars)", title, text.len());
        Ok(vec![TranscriptRecord::new(text, self.video_id.clone(), title)])
    }
}
