//! Language model completion.

mod openai;

pub use openai::OpenAICompletionClient;

use crate::error::Result;
use async_trait::async_trait;

/// One-shot chat completion. Clients keep no conversation state between calls.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a reply to `user` under the `system` instruction.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;

    /// Model identity, for logs.
    fn model(&self) -> &str;
}
