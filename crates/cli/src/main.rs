//! Pulse CLI
//!
//! Entry point for the `pulse` command-line assistant. Questions are routed
//! either to the static knowledge index or to live news before an answer is
//! synthesized.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, RouteCommand, StatsCommand};
use pulse_core::{config::AppConfig, logging, ConfigOverrides};
use std::path::PathBuf;

/// Pulse - routed question answering over a knowledge base and live news
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(about = "Routed question answering over a knowledge base and live news", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PULSE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Completion provider (gemini, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Knowledge chunks retrieved per question
    #[arg(short = 'k', long, global = true)]
    top_k: Option<usize>,

    /// Articles requested per live question
    #[arg(long, global = true)]
    max_articles: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive question/answer loop
    Chat(ChatCommand),

    /// Show which source would answer a question
    Route(RouteCommand),

    /// Show knowledge index statistics
    Stats(StatsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::Chat(_) => "chat",
            Commands::Route(_) => "route",
            Commands::Stats(_) => "stats",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(ConfigOverrides {
        provider: cli.provider,
        model: cli.model,
        top_k: cli.top_k,
        max_articles: cli.max_articles,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.provider, config.model);

    config.validate()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Route(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
