//! Retrieval-augmented question answering over the indexed transcript.

pub mod engine;
pub mod prompt;
pub mod retriever;

pub use engine::{GenerationOptions, RagEngine, RagResponse, RequestStage};
pub use prompt::{assemble, AugmentedPrompt, ConversationMessage, Role};
pub use retriever::{IndexStats, Retriever};
