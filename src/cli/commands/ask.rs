//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::ConversationMessage;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    input: &str,
    question: &str,
    top_k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(k) = top_k {
        settings.retrieval.top_k = k;
        settings.validate()?;
    }

    if let Err(e) = preflight::check(Operation::Answer, input, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidask doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let source = orchestrator.source_for(input);

    let spinner = Output::spinner(&format!("Indexing {}...", source.describe()));
    let engine = match orchestrator.build_engine(source.as_ref()).await {
        Ok(engine) => engine,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to index transcript: {}", e));
            return Err(e.into());
        }
    };

    spinner.set_message("Thinking...");
    match engine.answer(&[ConversationMessage::user(question)]).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::source(
                        &source.chunk.metadata.title,
                        source.chunk.metadata.position,
                        source.score,
                        &source.chunk.text,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
