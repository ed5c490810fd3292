//! OpenAI-compatible chat completions (OpenAI, Groq, local servers).

use super::CompletionClient;
use crate::error::{Result, VidaskError};
use crate::openai::{create_client, Endpoint};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat completion client for an OpenAI-compatible endpoint.
pub struct OpenAICompletionClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAICompletionClient {
    pub fn new(endpoint: &Endpoint, model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(endpoint)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAICompletionClient {
    #[instrument(skip(self, system, user), fields(model = %self.model, prompt_len = user.len()))]
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| VidaskError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| VidaskError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(max_tokens)
            .temperature(temperature)
            .build()
            .map_err(|e| VidaskError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            VidaskError::Generation(format!("Completion API error: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| VidaskError::Generation("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} chars", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
