//! Graph command handler.

use super::print_json;
use clap::Args;
use noteweave_core::AppResult;
use noteweave_knowledge::{
    bounded_traversal, build_graph, parse_vault, shortest_path, PathOutcome, UndirectedNoteGraph,
};
use std::path::PathBuf;

/// Inspect the wikilink graph of a vault
#[derive(Args, Debug)]
pub struct GraphCommand {
    /// Vault directory
    #[arg(long)]
    pub vault: PathBuf,

    /// Note key to start from
    #[arg(long)]
    pub start: Option<String>,

    /// Note key to find a path to
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Hops from the start note
    #[arg(long, default_value = "2")]
    pub hops: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl GraphCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing graph command for {:?}", self.vault);

        let notes = parse_vault(&self.vault)?;
        let graph: UndirectedNoteGraph = build_graph(&notes);

        match (&self.start, &self.end) {
            (Some(start), Some(end)) => match shortest_path(&graph, start, end) {
                PathOutcome::Found(path) if self.json => {
                    print_json(&serde_json::json!({ "path": path }))?
                }
                PathOutcome::Found(path) => println!("{}", path.join(" -> ")),
                PathOutcome::NoPath => println!("No path between {} and {}.", start, end),
                PathOutcome::UnknownNote(key) => println!("Unknown note: {}", key),
            },
            (Some(start), None) => {
                let visits = bounded_traversal(&graph, start, self.hops)
                    .map_err(|e| noteweave_core::AppError::Vault(e.to_string()))?;
                if self.json {
                    let visits: Vec<_> = visits
                        .iter()
                        .map(|v| serde_json::json!({ "note": v.key, "level": v.level }))
                        .collect();
                    print_json(&serde_json::json!({ "visits": visits }))?;
                } else {
                    for visit in &visits {
                        println!("{}\t{}", visit.level, visit.key);
                    }
                }
            }
            _ => {
                if self.json {
                    print_json(&serde_json::json!({
                        "notes": graph.node_count(),
                        "links": graph.edge_count(),
                    }))?;
                } else {
                    println!("{} notes, {} links", graph.node_count(), graph.edge_count());
                    for key in graph.keys() {
                        println!("{} -> {}", key, graph.neighbors(key).join(", "));
                    }
                }
            }
        }

        Ok(())
    }
}
