//! Request pipeline.
//!
//! Each request runs `Received -> EmbeddingQuery -> Retrieving -> Assembling
//! -> Generating -> Responded`, or stops in `Failed` when a collaborator
//! errors. Nothing is kept between requests besides the frozen index.

use super::prompt::{assemble, ConversationMessage, Role};
use super::retriever::Retriever;
use crate::completion::CompletionClient;
use crate::config::Settings;
use crate::error::{Result, VidaskError};
use crate::vector_store::RetrievalResult;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Where a request currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    EmbeddingQuery,
    Retrieving,
    Assembling,
    Generating,
    Responded,
    Failed,
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestStage::Received => "received",
            RequestStage::EmbeddingQuery => "embedding_query",
            RequestStage::Retrieving => "retrieving",
            RequestStage::Assembling => "assembling",
            RequestStage::Generating => "generating",
            RequestStage::Responded => "responded",
            RequestStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Per-request generation parameters.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Chunks placed in the context block.
    pub top_k: usize,
    pub embed_timeout: Duration,
    pub completion_timeout: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 1.2,
            top_k: 1,
            embed_timeout: Duration::from_secs(30),
            completion_timeout: Duration::from_secs(60),
        }
    }
}

impl GenerationOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_tokens: settings.completion.max_tokens,
            temperature: settings.completion.temperature,
            top_k: settings.retrieval.top_k,
            embed_timeout: settings.embedding.timeout(),
            completion_timeout: settings.completion.timeout(),
        }
    }
}

/// Answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<RetrievalResult>,
}

/// Answers questions about the indexed transcript.
pub struct RagEngine {
    retriever: Arc<Retriever>,
    completion: Arc<dyn CompletionClient>,
    system_instruction: String,
    options: GenerationOptions,
}

/// Tracks and logs the stage of one request.
struct StageTracker {
    stage: RequestStage,
}

impl StageTracker {
    fn new() -> Self {
        debug!(stage = %RequestStage::Received, "request stage");
        Self {
            stage: RequestStage::Received,
        }
    }

    fn advance(&mut self, next: RequestStage) {
        debug!(from = %self.stage, to = %next, "request stage");
        self.stage = next;
    }

    fn fail(&mut self, err: VidaskError) -> VidaskError {
        warn!(stage = %self.stage, code = err.code(), "Request failed: {}", err);
        self.stage = RequestStage::Failed;
        err
    }
}

impl RagEngine {
    pub fn new(
        retriever: Arc<Retriever>,
        completion: Arc<dyn CompletionClient>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            completion,
            system_instruction: system_instruction.into(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Answer the latest user message in `history`, grounded on the index.
    #[instrument(skip_all, fields(turns = history.len()))]
    pub async fn answer(&self, history: &[ConversationMessage]) -> Result<RagResponse> {
        let mut tracker = StageTracker::new();

        let query = latest_user_message(history).map_err(|e| tracker.fail(e))?;

        tracker.advance(RequestStage::EmbeddingQuery);
        let embedding = match tokio::time::timeout(
            self.options.embed_timeout,
            self.retriever.embed_query(query),
        )
        .await
        {
            Ok(result) => result.map_err(|e| tracker.fail(e))?,
            Err(_) => {
                return Err(tracker.fail(VidaskError::EmbeddingService(format!(
                    "Query embedding timed out after {:?}",
                    self.options.embed_timeout
                ))))
            }
        };

        tracker.advance(RequestStage::Retrieving);
        let sources = self
            .retriever
            .search(&embedding, self.options.top_k)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.advance(RequestStage::Assembling);
        let prompt = assemble(&self.system_instruction, &sources, history);
        debug!("Prompt assembled from {} chunks ({} bytes)", sources.len(), prompt.user.len());

        tracker.advance(RequestStage::Generating);
        let answer = match tokio::time::timeout(
            self.options.completion_timeout,
            self.completion.complete(
                &prompt.system,
                &prompt.user,
                self.options.max_tokens,
                self.options.temperature,
            ),
        )
        .await
        {
            Ok(result) => result
                .map_err(|e| match e {
                    VidaskError::Generation(_) => e,
                    other => VidaskError::Generation(other.to_string()),
                })
                .map_err(|e| tracker.fail(e))?,
            Err(_) => {
                return Err(tracker.fail(VidaskError::Generation(format!(
                    "Completion timed out after {:?}",
                    self.options.completion_timeout
                ))))
            }
        };

        tracker.advance(RequestStage::Responded);
        info!("Answered with {} using {} chunks", self.completion.model(), sources.len());

        Ok(RagResponse { answer, sources })
    }
}

/// The content of the last `user` message.
fn latest_user_message(history: &[ConversationMessage]) -> Result<&str> {
    if history.is_empty() {
        return Err(VidaskError::InvalidInput("No messages provided".to_string()));
    }
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .ok_or_else(|| VidaskError::InvalidInput("Conversation has no user message".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TranscriptChunk;
    use crate::config::Prompts;
    use crate::testing::{FailingCompletion, FailingEmbedder, HashingEmbedder, RecordingCompletion, SlowCompletion};
    use crate::embedding::Embedder;

    async fn retriever_over(embedder: Arc<dyn Embedder>, texts: &[&str]) -> Arc<Retriever> {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscriptChunk::new(*t, "e-gwvmhyU7A", "Lecture", i))
            .collect();
        Arc::new(Retriever::build(embedder, chunks, &Prompts::default()).await.unwrap())
    }

    #[tokio::test]
    async fn test_capital_of_france_end_to_end() {
        let retriever = retriever_over(
            Arc::new(HashingEmbedder::new(256)),
            &["Paris is the capital of France.", "Volcanoes form at plate boundaries."],
        )
        .await;
        let completion = Arc::new(RecordingCompletion::new("Paris."));
        let engine = RagEngine::new(retriever, completion.clone(), "Be helpful.");

        let response = engine
            .answer(&[ConversationMessage::user("What is the capital of France?")])
            .await
            .unwrap();

        assert_eq!(response.answer, "Paris.");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].chunk.text, "Paris is the capital of France.");

        let calls = completion.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, "Be helpful.");
        let context = calls[0].user.split("</CONTEXT>").next().unwrap();
        assert!(context.contains("Paris is the capital of France."));
        assert!(!context.contains("Volcanoes"));
        assert_eq!(calls[0].max_tokens, 1000);
    }

    #[tokio::test]
    async fn test_empty_index_still_answers() {
        let retriever = retriever_over(Arc::new(HashingEmbedder::new(64)), &[]).await;
        let completion = Arc::new(RecordingCompletion::new("I don't know."));
        let engine = RagEngine::new(retriever, completion.clone(), "sys");

        let response = engine
            .answer(&[ConversationMessage::user("Anything there?")])
            .await
            .unwrap();

        assert!(response.sources.is_empty());
        let calls = completion.calls();
        assert!(calls[0].user.starts_with("<CONTEXT>\n\n-------\n</CONTEXT>"));
        assert!(calls[0].user.ends_with("MY QUESTION:\nuser: Anything there?"));
    }

    #[tokio::test]
    async fn test_query_embedding_failure_surfaces() {
        let retriever = retriever_over(Arc::new(FailingEmbedder::on_query()), &["some text"]).await;
        let completion = Arc::new(RecordingCompletion::new("never"));
        let engine = RagEngine::new(retriever, completion.clone(), "sys");

        let err = engine
            .answer(&[ConversationMessage::user("question")])
            .await
            .unwrap_err();

        assert!(matches!(err, VidaskError::EmbeddingService(_)));
        assert!(completion.calls().is_empty());
    }

    #[tokio::test]
    async fn test_history_replayed_in_order() {
        let retriever = retriever_over(Arc::new(HashingEmbedder::new(64)), &["rocks and minerals"]).await;
        let completion = Arc::new(RecordingCompletion::new("ok"));
        let engine = RagEngine::new(retriever, completion.clone(), "sys");

        let history = vec![
            ConversationMessage::user("What is the video about?"),
            ConversationMessage::assistant("Geology."),
            ConversationMessage::user("Which rocks?"),
        ];
        engine.answer(&history).await.unwrap();

        let user = &completion.calls()[0].user;
        let section = user.split("MY QUESTION:\n").nth(1).unwrap();
        assert_eq!(
            section,
            "user: What is the video about?\n\nassistant: Geology.\n\nuser: Which rocks?"
        );
    }

    #[tokio::test]
    async fn test_latest_user_message_is_query() {
        let retriever = retriever_over(
            Arc::new(HashingEmbedder::new(256)),
            &["Paris is the capital of France.", "The Nile flows through Egypt."],
        )
        .await;
        let engine = RagEngine::new(retriever, Arc::new(RecordingCompletion::new("ok")), "sys");

        let history = vec![
            ConversationMessage::user("Tell me about France and Paris"),
            ConversationMessage::assistant("Sure."),
            ConversationMessage::user("Which river flows through Egypt?"),
            ConversationMessage::assistant("Let me check."),
        ];
        let response = engine.answer(&history).await.unwrap();
        assert_eq!(response.sources[0].chunk.text, "The Nile flows through Egypt.");
    }

    #[tokio::test]
    async fn test_invalid_conversations() {
        let retriever = retriever_over(Arc::new(HashingEmbedder::new(16)), &["x"]).await;
        let engine = RagEngine::new(retriever, Arc::new(RecordingCompletion::new("ok")), "sys");

        let err = engine.answer(&[]).await.unwrap_err();
        assert!(err.is_client_error());

        let err = engine
            .answer(&[ConversationMessage::assistant("Hello!")])
            .await
            .unwrap_err();
        assert!(matches!(err, VidaskError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_generation_failure() {
        let retriever = retriever_over(Arc::new(HashingEmbedder::new(16)), &["x"]).await;
        let engine = RagEngine::new(retriever, Arc::new(FailingCompletion), "sys");

        let err = engine.answer(&[ConversationMessage::user("q")]).await.unwrap_err();
        assert!(matches!(err, VidaskError::Generation(_)));
        assert_eq!(err.code(), "generation_error");
    }

    #[tokio::test]
    async fn test_completion_deadline() {
        let retriever = retriever_over(Arc::new(HashingEmbedder::new(16)), &["x"]).await;
        let engine = RagEngine::new(
            retriever,
            Arc::new(SlowCompletion::new(Duration::from_secs(5))),
            "sys",
        )
        .with_options(GenerationOptions {
            completion_timeout: Duration::from_millis(20),
            ..GenerationOptions::default()
        });

        let err = engine.answer(&[ConversationMessage::user("q")]).await.unwrap_err();
        assert!(matches!(err, VidaskError::Generation(ref msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_top_k_from_options() {
        let retriever = retriever_over(
            Arc::new(HashingEmbedder::new(128)),
            &["alpha beta", "beta gamma", "gamma delta"],
        )
        .await;
        let engine = RagEngine::new(retriever, Arc::new(RecordingCompletion::new("ok")), "sys")
            .with_options(GenerationOptions {
                top_k: 5,
                ..GenerationOptions::default()
            });

        let response = engine.answer(&[ConversationMessage::user("beta")]).await.unwrap();
        assert_eq!(response.sources.len(), 3);
        assert!(response.sources.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(RequestStage::EmbeddingQuery.to_string(), "embedding_query");
        assert_eq!(RequestStage::Failed.to_string(), "failed");
    }
}
