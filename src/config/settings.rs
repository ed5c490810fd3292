//! Configuration settings for Vidask.

use crate::chunking::{default_separators, ChunkingConfig};
use crate::error::{Result, VidaskError};
use crate::openai::Endpoint;
use crate::tokenizer::Encoding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub source: SourceSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub completion: CompletionSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Transcript source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Transcript to index when none is given on the command line
    /// (YouTube URL/ID or local file path).
    pub default_input: Option<String>,
    /// Caption language to request from YouTube.
    pub language: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            default_input: None,
            language: "en".to_string(),
        }
    }
}

/// Chunking settings. Sizes are in tokens of `encoding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Tokenizer vocabulary used to measure chunk length.
    pub encoding: Encoding,
    /// Maximum chunk length in tokens.
    pub max_tokens: usize,
    /// Tokens repeated from the previous chunk.
    pub overlap_tokens: usize,
    /// Separators, most meaningful first. An empty string splits characters.
    pub separators: Vec<String>,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            encoding: Encoding::P50kBase,
            max_tokens: 2000,
            overlap_tokens: 100,
            separators: default_separators(),
        }
    }
}

impl ChunkingSettings {
    pub fn to_config(&self) -> ChunkingConfig {
        ChunkingConfig {
            max_size: self.max_tokens,
            overlap: self.overlap_tokens,
            separators: self.separators.clone(),
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// OpenAI-compatible base URL (OpenAI if unset).
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Deadline for a single embedding call.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            base_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl EmbeddingSettings {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.base_url.clone(), &self.api_key_env).with_timeout(self.timeout())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks placed in the prompt context.
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 1 }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Chat model used to answer.
    pub model: String,
    /// OpenAI-compatible base URL.
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Maximum tokens in the answer.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Deadline for a single completion call.
    pub timeout_secs: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "llama3-8b-8192".to_string(),
            base_url: Some("https://api.groq.com/openai/v1".to_string()),
            api_key_env: "GROQ_API_KEY".to_string(),
            max_tokens: 1000,
            temperature: 1.2,
            timeout_secs: 60,
        }
    }
}

impl CompletionSettings {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.base_url.clone(), &self.api_key_env).with_timeout(self.timeout())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Send permissive CORS headers (any origin, method and header).
    pub allow_any_origin: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allow_any_origin: true,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check values that would otherwise fail deep inside the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_tokens == 0 {
            return Err(VidaskError::Config("chunking.max_tokens must be positive".to_string()));
        }
        if self.chunking.overlap_tokens >= self.chunking.max_tokens {
            return Err(VidaskError::Config(format!(
                "chunking.overlap_tokens ({}) must be smaller than chunking.max_tokens ({})",
                self.chunking.overlap_tokens, self.chunking.max_tokens
            )));
        }
        if self.chunking.separators.is_empty() {
            return Err(VidaskError::Config("chunking.separators must not be empty".to_string()));
        }
        if self.retrieval.top_k == 0 {
            return Err(VidaskError::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.embedding.dimensions == 0 {
            return Err(VidaskError::Config("embedding.dimensions must be positive".to_string()));
        }
        for (key, base_url) in [
            ("embedding.base_url", &self.embedding.base_url),
            ("completion.base_url", &self.completion.base_url),
        ] {
            if let Some(base_url) = base_url {
                url::Url::parse(base_url)
                    .map_err(|e| VidaskError::Config(format!("{} is not a valid URL: {}", key, e)))?;
            }
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| VidaskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidask")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
