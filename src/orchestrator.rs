//! Pipeline orchestrator for Vidask.
//!
//! Wires the configured collaborators together and runs the one-time startup
//! sequence: load the transcript, chunk it, embed the chunks and freeze the
//! index. The resulting [`RagEngine`] is owned by the caller (the server or a
//! one-shot CLI command) and injected wherever requests are handled.

use crate::chunking::{TranscriptChunk, TranscriptChunker};
use crate::completion::{CompletionClient, OpenAICompletionClient};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, VidaskError};
use crate::rag::{GenerationOptions, RagEngine, Retriever};
use crate::tokenizer::TokenCounter;
use crate::transcript::{detect_source, TranscriptRecord, TranscriptSource};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Vidask pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    chunker: TranscriptChunker,
    embedder: Arc<dyn Embedder>,
    completion: Arc<dyn CompletionClient>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the configured services.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(
            &settings.embedding.endpoint(),
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);

        let completion: Arc<dyn CompletionClient> = Arc::new(OpenAICompletionClient::new(
            &settings.completion.endpoint(),
            &settings.completion.model,
        )?);

        Self::with_components(settings, prompts, embedder, completion)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        let chunker = chunker_for(&settings)?;
        Ok(Self {
            settings,
            prompts,
            chunker,
            embedder,
            completion,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn chunker(&self) -> &TranscriptChunker {
        &self.chunker
    }

    /// The transcript to index: the explicit input, else `source.default_input`.
    pub fn resolve_input(&self, input: Option<&str>) -> Result<String> {
        resolve_input(&self.settings, input)
    }

    /// Transcript source for an input string.
    pub fn source_for(&self, input: &str) -> Box<dyn TranscriptSource> {
        detect_source(input, &self.settings.source.language)
    }

    /// Load a transcript. An empty transcript is allowed; it yields an empty index.
    pub async fn load_transcript(&self, source: &dyn TranscriptSource) -> Result<Vec<TranscriptRecord>> {
        info!("Loading transcript from {}", source.describe());
        let records = source.load().await?;
        if records.iter().all(|r| r.text.trim().is_empty()) {
            warn!("Transcript from {} is empty; the index will be empty", source.describe());
        }
        Ok(records)
    }

    pub fn chunk(&self, records: &[TranscriptRecord]) -> Vec<TranscriptChunk> {
        self.chunker.chunk(records)
    }

    /// Load, chunk and embed a transcript into a frozen index.
    #[instrument(skip_all, fields(source = %source.describe()))]
    pub async fn build_retriever(&self, source: &dyn TranscriptSource) -> Result<Retriever> {
        let records = self.load_transcript(source).await?;
        let chunks = self.chunk(&records);
        info!(
            "Chunked {} record(s) into {} chunks (max {} tokens, overlap {})",
            records.len(),
            chunks.len(),
            self.settings.chunking.max_tokens,
            self.settings.chunking.overlap_tokens
        );
        Retriever::build(self.embedder.clone(), chunks, &self.prompts).await
    }

    /// Run the startup sequence and return a ready engine.
    pub async fn build_engine(&self, source: &dyn TranscriptSource) -> Result<RagEngine> {
        let retriever = self.build_retriever(source).await?;
        Ok(self.engine_for(retriever))
    }

    /// Engine over an existing retriever, configured from settings.
    pub fn engine_for(&self, retriever: Retriever) -> RagEngine {
        RagEngine::new(
            Arc::new(retriever),
            self.completion.clone(),
            self.prompts.system_instruction(),
        )
        .with_options(GenerationOptions::from_settings(&self.settings))
    }
}

/// Chunker measuring length in tokens of the configured encoding.
pub fn chunker_for(settings: &Settings) -> Result<TranscriptChunker> {
    let counter = TokenCounter::new(settings.chunking.encoding)?;
    TranscriptChunker::from_config(&settings.chunking.to_config(), Arc::new(counter))
}

pub fn resolve_input(settings: &Settings, input: Option<&str>) -> Result<String> {
    input
        .map(str::to_string)
        .or_else(|| settings.source.default_input.clone())
        .ok_or_else(|| {
            VidaskError::Config(
                "No transcript given. Pass a YouTube URL/ID or file path, or set source.default_input"
                    .to_string(),
            )
        })
}
