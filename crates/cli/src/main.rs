//! Veriqa CLI
//!
//! Main entry point for the veriqa command-line tool.
//! Answers questions with two LLM providers over retrieved context and
//! scores each answer for hallucination.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CallCommand, ContextCommand, ImproveCommand, PromptsCommand, QueryCommand};
use dotenv::dotenv;
use std::path::PathBuf;
use veriqa_core::{config::AppConfig, logging, AppResult};

/// Veriqa - grounded answers with hallucination scoring
#[derive(Parser, Debug)]
#[command(name = "veriqa")]
#[command(about = "Grounded answers from two LLMs, scored for hallucination", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "VERIQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "VERIQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Per-query deadline in seconds (0 disables it)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question with both providers and score the answers
    Query(QueryCommand),

    /// Rewrite a question to be more precise
    Improve(ImproveCommand),

    /// Show the context passage retrieved for a query
    Context(ContextCommand),

    /// Send a raw JSON request to an endpoint handler
    Call(CallCommand),

    /// List available prompts
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Secrets may live in a local .env file
    dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.timeout,
    );

    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)?;
    config.validate()?;

    tracing::info!("Veriqa CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);

    let command_name = match &cli.command {
        Commands::Query(_) => "query",
        Commands::Improve(_) => "improve",
        Commands::Context(_) => "context",
        Commands::Call(_) => "call",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Improve(cmd) => cmd.execute(&config).await,
        Commands::Context(cmd) => cmd.execute(&config).await,
        Commands::Call(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
