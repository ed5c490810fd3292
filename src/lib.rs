//! Vidask - ask questions about a video
//!
//! Indexes the transcript of one YouTube video (or a local transcript file)
//! and answers questions about it with retrieval-augmented generation.
//!
//! # Overview
//!
//! At startup the transcript is split into token-bounded, overlapping chunks,
//! every chunk is embedded, and the vectors are frozen into an in-memory
//! index. Each question is then embedded once, the nearest chunks are placed
//! in a context block ahead of the conversation, and a chat model answers.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Transcript sources (YouTube captions, local files)
//! - `tokenizer` - Token counting for chunk budgets
//! - `chunking` - Recursive, overlap-aware chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Frozen in-memory vector index
//! - `completion` - Chat completion client
//! - `rag` - Prompt assembly, retrieval and the request pipeline
//! - `orchestrator` - Startup sequence
//! - `server` - HTTP request boundary
//!
//! # Example
//!
//! ```rust,no_run
//! use vidask::config::Settings;
//! use vidask::orchestrator::Orchestrator;
//! use vidask::rag::ConversationMessage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(Settings::load()?)?;
//!     let source = orchestrator.source_for("e-gwvmhyU7A");
//!     let engine = orchestrator.build_engine(source.as_ref()).await?;
//!
//!     let response = engine
//!         .answer(&[ConversationMessage::user("What is this video about?")])
//!         .await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod server;
pub mod tokenizer;
pub mod transcript;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, VidaskError};
