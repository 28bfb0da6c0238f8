//! Sources command handler.

use super::{open_store, print_json};
use clap::{Args, Subcommand};
use noteweave_core::{config::AppConfig, AppResult};
use noteweave_knowledge::{delete_source, list_sources};

/// List or delete ingested source documents
#[derive(Args, Debug)]
pub struct SourcesCommand {
    #[command(subcommand)]
    pub action: SourcesAction,
}

#[derive(Subcommand, Debug)]
pub enum SourcesAction {
    /// List source documents with stored chunks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every stored chunk of a source document
    Delete {
        /// Source filename as listed
        filename: String,
    },
}

impl SourcesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let store = open_store(config).await?;
        let collection = &config.store.chunk_collection;

        match &self.action {
            SourcesAction::List { json } => {
                let sources = list_sources(&store, collection).await?;
                if *json {
                    print_json(&serde_json::json!({ "sources": sources }))?;
                } else if sources.is_empty() {
                    println!("No sources ingested");
                } else {
                    for source in sources {
                        println!("{}", source);
                    }
                }
            }
            SourcesAction::Delete { filename } => {
                let deleted = delete_source(&store, collection, filename).await?;
                println!("Deleted {} chunks of {}", deleted, filename);
            }
        }

        Ok(())
    }
}
