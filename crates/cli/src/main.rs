//! noteweave CLI
//!
//! Main entry point for the noteweave command-line tool.
//! Turns documents into linked vault notes and answers questions from them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    ChatCommand, GenerateCommand, GraphCommand, IngestCommand, SourcesCommand, SyncCommand,
};
use noteweave_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// noteweave - LLM-written notes linked into a markdown vault
#[derive(Parser, Debug)]
#[command(name = "noteweave")]
#[command(about = "LLM-written notes linked into a markdown vault", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NOTEWEAVE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NOTEWEAVE_CONFIG")]
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

    /// LLM provider (ollama, gemini, huggingface)
    #[arg(short, long, global = true, env = "NOTEWEAVE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "NOTEWEAVE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the notes store with the vault on disk
    Sync(SyncCommand),

    /// Split documents into chunks and store them
    Ingest(IngestCommand),

    /// Generate linked notes from documents
    Generate(GenerateCommand),

    /// Ask a question about your notes
    Chat(ChatCommand),

    /// Inspect the wikilink graph of a vault
    Graph(GraphCommand),

    /// List or delete ingested source documents
    Sources(SourcesCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from file and environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::info!("noteweave starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {:?}", config.model);

    let command_name = match &cli.command {
        Commands::Sync(_) => "sync",
        Commands::Ingest(_) => "ingest",
        Commands::Generate(_) => "generate",
        Commands::Chat(_) => "chat",
        Commands::Graph(_) => "graph",
        Commands::Sources(_) => "sources",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Sync(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Generate(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Graph(cmd) => cmd.execute(),
        Commands::Sources(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
