//! Sync command handler.

use super::{open_store, print_json};
use clap::Args;
use noteweave_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Reconcile the notes store with the vault on disk
#[derive(Args, Debug)]
pub struct SyncCommand {
    /// Vault directory
    #[arg(long)]
    pub vault: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SyncCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing sync command for {:?}", self.vault);

        let store = open_store(config).await?;
        let report =
            noteweave_knowledge::sync(&store, &config.store.notes_collection, &self.vault).await?;

        if self.json {
            print_json(&serde_json::json!({
                "filesSeen": report.files_seen,
                "recordsSeen": report.records_seen,
                "deleted": report.deleted,
                "added": report.added,
            }))?;
        } else if report.is_noop() {
            println!(
                "Vault in sync ({} files, {} records)",
                report.files_seen, report.records_seen
            );
        } else {
            for title in &report.deleted {
                println!("DELETED: {}", title);
            }
            for title in &report.added {
                println!("ADDED: {}", title);
            }
        }

        Ok(())
    }
}
