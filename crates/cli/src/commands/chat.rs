//! Chat command handler.
//!
//! Reads questions from stdin and answers each one until `exit`.

use crate::commands::ask::print_answer;
use anyhow::{Context as _, Result};
use clap::Args;
use pulse_assistant::Pipeline;
use pulse_core::{config::AppConfig, AppError};
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;

/// Word that ends the session, compared case-insensitively.
const EXIT_WORD: &str = "exit";

/// What the user did at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Question(String),
    Exit,
}

/// Interactive question/answer loop
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Show the snippets each answer was grounded in
    #[arg(long)]
    pub show_context: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing chat command");

        let pipeline = Pipeline::from_config(config).context("Failed to build pipeline")?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("Ask a question (type '{}' to quit).", EXIT_WORD);

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let question = match next_input(&mut lines, tokio::signal::ctrl_c()).await? {
                Input::Question(question) => question,
                Input::Exit => break,
            };

            // A failed question does not end the session
            match self.answer_one(&pipeline, &question).await {
                Ok(()) => {}
                Err(AppError::Cancelled) => println!("(cancelled)"),
                Err(err) => {
                    tracing::error!("Question failed: {}", err);
                    eprintln!("Error: {}", err);
                }
            }
        }

        tracing::info!("Chat session ended");
        Ok(())
    }

    async fn answer_one(&self, pipeline: &Pipeline, question: &str) -> Result<(), AppError> {
        let cancel = CancellationToken::new();
        let ctrl_c = cancel.clone();

        let answer = tokio::select! {
            result = pipeline.answer_with_cancellation(question, &cancel) => result?,
            _ = tokio::signal::ctrl_c() => {
                ctrl_c.cancel();
                return Err(AppError::Cancelled);
            }
        };

        print_answer(&answer, self.show_context);
        println!();
        Ok(())
    }
}

/// Wait for the next non-empty line.
///
/// End of input, the exit word, and `interrupted` resolving (Ctrl-C at the
/// prompt) all end the session.
async fn next_input<R, F, T>(lines: &mut Lines<R>, interrupted: F) -> std::io::Result<Input>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = T>,
{
    tokio::pin!(interrupted);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut interrupted => {
                println!();
                return Ok(Input::Exit);
            }
        };

        let Some(line) = line else {
            return Ok(Input::Exit);
        };
        let question = line.trim();

        if is_exit(question) {
            return Ok(Input::Exit);
        }
        if !question.is_empty() {
            return Ok(Input::Question(question.to_string()));
        }
    }
}

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case(EXIT_WORD)
}
