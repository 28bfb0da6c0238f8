//! Generate command handler.

use super::{llm_client, open_store, print_json};
use clap::Args;
use noteweave_core::{config::AppConfig, AppResult};
use noteweave_knowledge::{run_generation, GenerationOptions};
use noteweave_prompt::{load_prompt, NOTE_GENERATION};
use std::path::PathBuf;
use std::time::Duration;

/// Generate linked notes from documents
#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// Markdown file or directory of documents
    pub source: PathBuf,

    /// Vault directory the notes are written to
    #[arg(long)]
    pub vault: PathBuf,

    /// Tags put on every note (e.g. "#neuroscience #mice")
    #[arg(long)]
    pub tags: Option<String>,

    /// LLM attempts per chunk
    #[arg(long)]
    pub max_retry: Option<u32>,

    /// Seconds to wait before each chunk's first LLM call
    #[arg(long)]
    pub cooldown: Option<u64>,

    /// Maximum cosine distance of context chunks and related notes
    #[arg(long)]
    pub max_distance: Option<f32>,

    /// Use chunks and notes from every vault, not only the target one
    #[arg(long)]
    pub all_vaults: bool,

    /// Keep chunks under back-matter headers (references, appendix, ...)
    #[arg(long)]
    pub keep_all_headers: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl GenerateCommand {
    fn options(&self, config: &AppConfig) -> GenerationOptions {
        let mut options = GenerationOptions::from_config(config);
        if let Some(tags) = &self.tags {
            options.tags = tags.clone();
        }
        if let Some(retry) = self.max_retry {
            options.max_llm_retry = retry;
        }
        if let Some(secs) = self.cooldown {
            options.cooldown = Duration::from_secs(secs);
        }
        if let Some(distance) = self.max_distance {
            options.max_cosine_distance = distance;
        }
        if self.all_vaults {
            options.restrict_to_vault = false;
        }
        if self.keep_all_headers {
            options.split.filter_on_headers = false;
        }
        options
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing generate command for {:?}", self.source);

        let options = self.options(config);
        tracing::debug!("Generation options: {:?}", options);

        let store = open_store(config).await?;
        let llm = llm_client(config)?;
        let prompt = load_prompt(&config.workspace, NOTE_GENERATION)?;

        let report = run_generation(
            &store,
            llm.as_ref(),
            &prompt,
            &self.source,
            &self.vault,
            &options,
        )
        .await?;

        if self.json {
            let written: Vec<_> = report.written.iter().map(|p| p.display().to_string()).collect();
            print_json(&serde_json::json!({
                "processed": report.processed,
                "written": written,
                "skippedDuplicate": report.skipped_duplicate,
                "skippedNoContext": report.skipped_no_context,
                "skippedUnparsable": report.skipped_unparsable,
                "failed": report.failed,
                "unsupported": report.unsupported.len(),
            }))?;
        } else {
            for path in &report.written {
                println!("ADDED: {}", path.display());
            }
            println!(
                "{} chunks: {} notes written, {} duplicate, {} without context, {} unparsable, {} failed",
                report.processed,
                report.written.len(),
                report.skipped_duplicate,
                report.skipped_no_context,
                report.skipped_unparsable,
                report.failed
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        cmd: GenerateCommand,
    }

    #[test]
    fn test_flags_override_config() {
        let harness = Harness::parse_from([
            "generate",
            "docs",
            "--vault",
            "vault",
            "--tags",
            "#bio",
            "--cooldown",
            "0",
            "--all-vaults",
        ]);
        let options = harness.cmd.options(&AppConfig::default());
        assert_eq!(options.tags, "#bio");
        assert_eq!(options.cooldown, Duration::ZERO);
        assert!(!options.restrict_to_vault);
        assert_eq!(options.max_llm_retry, 3);
    }
}
