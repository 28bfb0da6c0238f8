//! Chat command handler.

use super::{llm_client, open_store};
use clap::Args;
use noteweave_core::{config::AppConfig, AppError, AppResult};
use noteweave_knowledge::{chat, graph_chat, parse_vault, ChatOptions, ChatTurn, GraphScope};
use noteweave_prompt::{load_prompt, CHAT_ANSWER};
use std::path::PathBuf;

/// Ask a question about your notes
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// The question
    pub message: String,

    /// JSON file with earlier turns: [{"role": "user", "content": "..."}]
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Maximum cosine distance of retrieved notes
    #[arg(long)]
    pub max_distance: Option<f32>,

    /// Build context by walking the vault's wikilink graph
    #[arg(long, requires = "vault")]
    pub graph: bool,

    /// Vault directory (graph mode)
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Start note key (graph mode); defaults to the closest note
    #[arg(long)]
    pub start: Option<String>,

    /// End note key (graph mode); uses the shortest path from start
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Hops from the start note (graph mode)
    #[arg(long, default_value = "2")]
    pub hops: usize,
}

impl ChatCommand {
    fn load_history(&self) -> AppResult<Vec<ChatTurn>> {
        let Some(path) = &self.history else {
            return Ok(Vec::new());
        };
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("Invalid history file {:?}: {}", path, e)))
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let history = self.load_history()?;
        let mut options = ChatOptions::from_config(config);
        if let Some(distance) = self.max_distance {
            options.max_cosine_distance = distance;
        }

        let store = open_store(config).await?;
        let llm = llm_client(config)?;
        let prompt = load_prompt(&config.workspace, CHAT_ANSWER)?;

        let answer = match (&self.vault, self.graph) {
            (Some(vault), true) => {
                let notes = parse_vault(vault)?;
                let scope = GraphScope {
                    start: self.start.as_deref(),
                    end: self.end.as_deref(),
                    hops: self.hops,
                };
                graph_chat(
                    &store,
                    llm.as_ref(),
                    &prompt,
                    &self.message,
                    &history,
                    &notes,
                    scope,
                    &options,
                )
                .await?
            }
            _ => chat(&store, llm.as_ref(), &prompt, &self.message, &history, &options).await?,
        };

        println!("{}", answer.message());
        Ok(())
    }
}
