//! Ask command handler.
//!
//! Answers a single question through the full pipeline.

use anyhow::{bail, Context as _, Result};
use clap::Args;
use pulse_assistant::{Answer, Pipeline};
use pulse_core::{config::AppConfig, SnippetOrigin};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Show the snippets the answer was grounded in
    #[arg(long)]
    pub show_context: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question()?;
        let pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;

        let cancel = cancel_on_ctrl_c();
        let answer = pipeline.answer_with_cancellation(&question, &cancel).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            print_answer(&answer, self.show_context);
        }

        Ok(())
    }

    fn question(&self) -> Result<String> {
        let question = match (&self.question, &self.file) {
            (Some(question), _) => question.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read question from {:?}", path))?,
            (None, None) => bail!("No question provided"),
        };

        if question.trim().is_empty() {
            bail!("Question is empty");
        }
        Ok(question)
    }
}

/// Cancellation token fired by Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling");
            signal.cancel();
        }
    });
    token
}

/// Print an answer, optionally followed by its snippets.
pub fn print_answer(answer: &Answer, show_context: bool) {
    println!("{}", answer.text);

    if !show_context || answer.snippets.is_empty() {
        return;
    }

    println!();
    println!("Context ({} route):", answer.route);
    for (i, snippet) in answer.snippets.iter().enumerate() {
        let label = match snippet.origin {
            SnippetOrigin::Knowledge { score } => format!("score {:.3}", score),
            SnippetOrigin::Live => "live".to_string(),
            SnippetOrigin::Unavailable => "unavailable".to_string(),
        };
        println!("  [{}] ({}) {}", i + 1, label, snippet.render().replace('\n', " | "));
    }
}
