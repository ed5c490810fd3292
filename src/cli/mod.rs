//! CLI module for Vidask.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Vidask - ask questions about a video
///
/// Indexes one YouTube video's transcript (or a local transcript file) and
/// answers questions about it with retrieval-augmented generation.
#[derive(Parser, Debug)]
#[command(name = "vidask")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDASK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a transcript and serve the question-answering API
    Serve {
        /// YouTube URL/ID or transcript file (defaults to source.default_input)
        input: Option<String>,

        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question about a transcript
    Ask {
        /// YouTube URL/ID or transcript file
        input: String,

        /// The question to ask
        question: String,

        /// Number of transcript chunks to use as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show how a transcript would be chunked
    Chunks {
        /// YouTube URL/ID or transcript file
        input: String,

        /// Maximum chunk length in tokens
        #[arg(long)]
        max_tokens: Option<usize>,

        /// Tokens repeated between consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
