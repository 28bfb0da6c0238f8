//! Command handlers for the noteweave CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod chat;
pub mod generate;
pub mod graph;
pub mod ingest;
pub mod sources;
pub mod sync;

pub use chat::ChatCommand;
pub use generate::GenerateCommand;
pub use graph::GraphCommand;
pub use ingest::IngestCommand;
pub use sources::SourcesCommand;
pub use sync::SyncCommand;

use noteweave_core::{config::AppConfig, AppResult};
use noteweave_knowledge::{create_provider, SqliteStore};
use noteweave_llm::{create_client, LlmClient};
use std::sync::Arc;

/// Open the configured store with the configured embedder.
pub async fn open_store(config: &AppConfig) -> AppResult<SqliteStore> {
    let path = config.store_path();
    let embedder = create_provider(&config.embedding, config.endpoint.as_deref()).await?;
    tracing::debug!("Opening store {:?} ({})", path, embedder.provider_name());
    SqliteStore::open(&path, embedder)
}

/// Build the configured LLM client.
pub fn llm_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let api_key = config.resolve_api_key();
    create_client(
        &config.provider,
        config.model.as_deref(),
        config.endpoint.as_deref(),
        api_key.as_deref(),
    )
}

/// Print a JSON value.
pub fn print_json(value: &serde_json::Value) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
