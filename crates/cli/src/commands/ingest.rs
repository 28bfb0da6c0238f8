//! Ingest command handler.

use super::{open_store, print_json};
use clap::Args;
use noteweave_core::{config::AppConfig, AppResult};
use noteweave_knowledge::{collect_sources, ingest_document, SplitOptions};
use std::path::PathBuf;

/// Split documents into chunks and store them
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Markdown file or directory of documents
    pub source: PathBuf,

    /// Vault the chunks belong to
    #[arg(long)]
    pub vault: PathBuf,

    /// Keep chunks under back-matter headers (references, appendix, ...)
    #[arg(long)]
    pub keep_all_headers: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.source);

        let store = open_store(config).await?;
        let files = collect_sources(&self.source)?;
        let options = SplitOptions {
            filter_on_headers: config.generation.filter_on_headers && !self.keep_all_headers,
            ..SplitOptions::default()
        };

        let mut ingested = Vec::new();
        for path in &files.markdown {
            let chunks = ingest_document(
                &store,
                &config.store.chunk_collection,
                path,
                &self.vault,
                &options,
            )
            .await?;
            ingested.push((path.display().to_string(), chunks.len()));
        }

        if self.json {
            let documents: Vec<_> = ingested
                .iter()
                .map(|(path, chunks)| serde_json::json!({ "path": path, "chunks": chunks }))
                .collect();
            let unsupported: Vec<_> = files
                .unsupported
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            print_json(&serde_json::json!({
                "documents": documents,
                "unsupported": unsupported,
            }))?;
        } else {
            for (path, chunks) in &ingested {
                println!("{}: {} chunks", path, chunks);
            }
            for path in &files.unsupported {
                println!("{}: unsupported format, skipped", path.display());
            }
        }

        Ok(())
    }
}
