//! Error types for Vidask.

use thiserror::Error;

/// Library-level error type for Vidask operations.
#[derive(Error, Debug)]
pub enum VidaskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript source error: {0}")]
    TranscriptSource(String),

    #[error("Chunking failed: {0}")]
    Chunking(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VidaskError {
    /// Stable failure code reported to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            VidaskError::Config(_) => "config_error",
            VidaskError::TranscriptSource(_) => "transcript_source_error",
            VidaskError::Chunking(_) => "chunking_error",
            VidaskError::EmbeddingService(_) => "embedding_service_error",
            VidaskError::Retrieval(_) => "retrieval_error",
            VidaskError::Generation(_) => "generation_error",
            VidaskError::InvalidInput(_) => "invalid_request",
            VidaskError::ToolNotFound(_) => "tool_not_found",
            VidaskError::Io(_) => "io_error",
            VidaskError::Json(_) => "json_error",
            VidaskError::TomlParse(_) => "config_error",
            VidaskError::Http(_) => "http_error",
        }
    }

    /// Whether the caller, rather than a collaborator, caused the failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, VidaskError::InvalidInput(_))
    }
}

/// Result type alias for Vidask operations.
pub type Result<T> = std::result::Result<T, VidaskError>;
