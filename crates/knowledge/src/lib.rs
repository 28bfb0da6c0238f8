//! Knowledge vault engine.
//!
//! Keeps a notes collection in step with a markdown vault, turns source
//! documents into linked notes with an LLM, and answers questions from the
//! notes either by similarity search or by walking the wikilink graph.

pub mod chat;
pub mod chunk;
pub mod edit;
pub mod embeddings;
pub mod generation;
pub mod graph;
pub mod ids;
pub mod images;
pub mod ingest;
pub mod store;
pub mod sync;
pub mod traversal;
pub mod vault;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use chat::{chat, graph_chat, ChatAnswer, ChatOptions, ChatTurn, GraphScope};
pub use chunk::{split_markdown, Chunk, SplitOptions};
pub use edit::{delete_source, list_sources};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use generation::{run_generation, GenerationOptions, GenerationReport, NoteGenerator};
pub use graph::{build_graph, DirectedNoteGraph, NoteGraph, UndirectedNoteGraph};
pub use ingest::{collect_sources, ingest_document};
pub use store::{Filter, QueryHit, Record, SqliteStore, VectorStore};
pub use sync::{sync, SyncReport};
pub use traversal::{bounded_traversal, shortest_path, PathOutcome, TraversalError, Visit};
pub use vault::{parse_vault, Notes, ParsedNote};
