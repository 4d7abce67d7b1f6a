//! Stats command handler.
//!
//! Shows statistics of the knowledge index.

use anyhow::{Context as _, Result};
use clap::Args;
use pulse_core::config::AppConfig;
use pulse_knowledge::ContextRetriever;

/// Show knowledge index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing stats command");

        let retriever = ContextRetriever::from_config(config)?;
        let stats = retriever.stats().await.with_context(|| {
            format!(
                "Failed to read index at {:?}",
                config.resolved_index_path()
            )
        })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Knowledge index: {}", stats.path.display());
            println!("  Sources: {}", stats.sources_count);
            println!("  Chunks: {}", stats.chunks_count);
            if let Some(dimensions) = stats.dimensions {
                println!("  Dimensions: {}", dimensions);
            }
            println!("  DB size: {} bytes", stats.db_size_bytes);
            println!(
                "  Embeddings: {} ({})",
                config.embedding_provider, config.embedding_model
            );
        }

        Ok(())
    }
}
