//! Index command: build the corpus index once and report it.

use crate::cli::preflight;
use crate::cli::services::{load_index, openai_client};
use crate::cli::Output;
use crate::config::Settings;
use crate::sources::MAX_INDEXED_SOURCES;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vidchat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let client = openai_client(&settings)?;
    let progress = Output::progress_bar(0, "Fetching transcripts");
    let index = load_index(&settings, client, progress.clone()).await;
    progress.finish_and_clear();

    let index = match index {
        Ok(index) => index,
        Err(e) => {
            Output::error(&format!("Failed to build index: {}", e));
            return Err(e.into());
        }
    };

    let summary = index.summary().await?;
    Output::header(&format!("Indexed Sources ({})", summary.len()));
    println!();
    for item in &summary {
        Output::source_info(
            &item.source,
            &item.video_id,
            item.chunk_count,
            item.total_duration_seconds,
        );
    }

    let total_chunks: u32 = summary.iter().map(|s| s.chunk_count).sum();
    println!();
    Output::kv("Total sources", &summary.len().to_string());
    Output::kv("Total passages", &total_chunks.to_string());
    Output::kv("Source cap", &MAX_INDEXED_SOURCES.to_string());
    Output::success("Index built.");

    Ok(())
}
