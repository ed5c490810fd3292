//! OpenAI-compatible client construction.
//!
//! Both the embedding service and the language model service speak the
//! OpenAI HTTP API, so they share this builder and differ only in endpoint,
//! key and timeout.

use crate::error::{Result, VidaskError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Endpoint description for an OpenAI-compatible service.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Base URL, e.g. `https://api.groq.com/openai/v1`. `None` uses the OpenAI default.
    pub base_url: Option<String>,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(base_url: Option<String>, api_key_env: &str) -> Self {
        Self {
            base_url,
            api_key_env: api_key_env.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Create a client for the given endpoint.
///
/// A missing API key is not an error here; local OpenAI-compatible servers
/// usually accept unauthenticated requests. The key always comes from
/// `api_key_env`, never from the client library's `OPENAI_API_KEY` default.
pub fn create_client(endpoint: &Endpoint) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(endpoint.timeout)
        .build()
        .map_err(|e| VidaskError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let api_key = std::env::var(&endpoint.api_key_env).unwrap_or_default();
    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = &endpoint.base_url {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
