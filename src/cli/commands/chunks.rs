//! Chunks command: preview how a transcript is split.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::chunker_for;
use crate::transcript::detect_source;
use anyhow::Result;

/// Run the chunks command.
pub async fn run_chunks(
    input: &str,
    max_tokens: Option<usize>,
    overlap: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(max_tokens) = max_tokens {
        settings.chunking.max_tokens = max_tokens;
    }
    if let Some(overlap) = overlap {
        settings.chunking.overlap_tokens = overlap;
    }
    settings.validate()?;

    preflight::check(Operation::Fetch, input, &settings)?;

    let chunker = chunker_for(&settings)?;
    let source = detect_source(input, &settings.source.language);

    let spinner = Output::spinner(&format!("Loading {}...", source.describe()));
    let records = source.load().await;
    spinner.finish_and_clear();
    let records = records?;

    let chunks = chunker.chunk(&records);
    let splitter = chunker.splitter();

    Output::header(&format!("{} chunks", chunks.len()));
    for record in &records {
        Output::kv("Transcript", &format!("{} ({})", record.metadata.title, record.metadata.source));
    }
    Output::kv(
        "Budget",
        &format!(
            "{} tokens ({}), overlap {}",
            splitter.max_size(),
            settings.chunking.encoding,
            splitter.overlap()
        ),
    );
    println!();

    let mut oversized = 0;
    for chunk in &chunks {
        let tokens = splitter.measure(&chunk.text);
        if tokens > splitter.max_size() {
            oversized += 1;
        }
        Output::chunk(chunk.metadata.position, tokens, &chunk.text);
    }

    if oversized > 0 {
        println!();
        Output::warning(&format!(
            "{} chunk(s) exceed the budget because a single word is longer than it",
            oversized
        ));
    }

    Ok(())
}
