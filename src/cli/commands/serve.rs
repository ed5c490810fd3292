//! Serve command: index once, then answer over HTTP.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::server::{self, AppState};
use anyhow::Result;
use std::sync::Arc;

/// Run the HTTP API server.
pub async fn run_serve(
    input: Option<&str>,
    host: Option<&str>,
    port: Option<u16>,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let input = orchestrator.resolve_input(input)?;
    let host = host.unwrap_or(&orchestrator.settings().server.host).to_string();
    let port = port.unwrap_or(orchestrator.settings().server.port);
    let allow_any_origin = orchestrator.settings().server.allow_any_origin;

    if let Err(e) = preflight::check(Operation::Answer, &input, orchestrator.settings()) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidask doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let source = orchestrator.source_for(&input);
    let spinner = Output::spinner(&format!("Indexing {}...", source.describe()));
    let engine = orchestrator.build_engine(source.as_ref()).await;
    spinner.finish_and_clear();
    // An index that failed to build is never served.
    let engine = engine?;

    let stats = engine.retriever().stats().clone();

    Output::header("Vidask API Server");
    println!();
    for source in &stats.sources {
        Output::kv("Transcript", &format!("{} ({})", source.title, source.source));
    }
    Output::kv("Chunks", &stats.chunks.to_string());
    Output::kv("Embeddings", &stats.embedding_model);
    println!();
    Output::success(&format!("Listening on http://{}:{}", host, port));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /api/ask");
    Output::kv("Index", "GET  /api/index");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::serve(Arc::new(AppState::new(engine)), &host, port, allow_any_origin).await?;

    Ok(())
}
