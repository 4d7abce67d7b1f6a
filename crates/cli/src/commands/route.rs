//! Route command handler.
//!
//! Prints the routing decision for a question without retrieving or
//! answering.

use anyhow::{Context as _, Result};
use clap::Args;
use pulse_assistant::Pipeline;
use pulse_core::config::AppConfig;

/// Show which source would answer a question
#[derive(Args, Debug)]
pub struct RouteCommand {
    /// The question to classify
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RouteCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing route command");

        let pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;
        let route = pipeline.router().classify(&self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "route": route,
                "token": route.as_token(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", route);
        }

        Ok(())
    }
}
