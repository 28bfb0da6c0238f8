//! Question answering over the notes collection and the note graph.

use crate::graph::{build_graph, UndirectedNoteGraph};
use crate::store::{QueryHit, VectorStore};
use crate::traversal::{bounded_traversal, shortest_path, PathOutcome, TraversalError};
use crate::vault::Notes;
use noteweave_core::{AppConfig, AppResult};
use noteweave_llm::LlmClient;
use noteweave_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const NO_REFERENCE_MESSAGE: &str =
    "Couldn't find reference to answer your query. Maybe loosen the similarity threshold?";

pub const NO_GRAPH_REFERENCE_MESSAGE: &str = "Couldn't find reference to answer your query. \
     Maybe loosen the similarity threshold or try selecting different start and ends?";

/// One turn of the conversation so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Outcome of a chat request.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAnswer {
    Answered {
        /// Model reply followed by the reference list
        text: String,
        references: Vec<String>,
    },
    NoReference(String),
    NoPath {
        start: String,
        end: String,
    },
    UnknownNote(String),
}

impl ChatAnswer {
    /// Text shown to the user.
    pub fn message(&self) -> String {
        match self {
            ChatAnswer::Answered { text, .. } => text.clone(),
            ChatAnswer::NoReference(message) => message.clone(),
            ChatAnswer::NoPath { start, end } => format!("No path between {} and {}.", start, end),
            ChatAnswer::UnknownNote(key) => format!("Unknown note: {}", key),
        }
    }
}

/// Retrieval settings for chat.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub notes_collection: String,
    pub max_cosine_distance: f32,
    /// Notes retrieved for the message alone
    pub message_k: usize,
    /// Notes retrieved for history plus message
    pub history_k: usize,
    pub max_references: usize,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            notes_collection: "markdown_notes".to_string(),
            max_cosine_distance: 0.3,
            message_k: 3,
            history_k: 2,
            max_references: 10,
        }
    }
}

impl ChatOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            notes_collection: config.store.notes_collection.clone(),
            max_cosine_distance: config.generation.max_cosine_distance,
            ..Self::default()
        }
    }
}

/// `"{Role}: {content}\n"` per turn.
pub fn history_text(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}\n", capitalize(&turn.role), turn.content))
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

fn titles_of(hits: &[QueryHit]) -> Vec<String> {
    hits.iter()
        .filter_map(|h| h.record.meta_str("title"))
        .map(str::to_string)
        .collect()
}

fn push_unique(into: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

async fn answer(
    llm: &dyn LlmClient,
    prompt: &PromptDefinition,
    history: &str,
    message: &str,
    context: &str,
    references: Vec<String>,
) -> AppResult<ChatAnswer> {
    let vars = HashMap::from([
        ("history".to_string(), history.to_string()),
        ("message".to_string(), message.to_string()),
        ("context".to_string(), context.to_string()),
    ]);
    let built = build_prompt(prompt, vars)?;
    let reply = llm.generate(built.system_or_empty(), &built.user).await?;

    let text = format!("{}\n\n## Reference\n- {}", reply, references.join("\n- "));
    Ok(ChatAnswer::Answered { text, references })
}

/// Answer from the notes nearest to the message and to the conversation.
pub async fn chat(
    store: &dyn VectorStore,
    llm: &dyn LlmClient,
    prompt: &PromptDefinition,
    message: &str,
    history: &[ChatTurn],
    options: &ChatOptions,
) -> AppResult<ChatAnswer> {
    let history = history_text(history);
    let max = Some(options.max_cosine_distance);

    let direct = store
        .query(&options.notes_collection, message, options.message_k, None, max)
        .await?;
    let with_history = store
        .query(
            &options.notes_collection,
            &format!("{}User: {}", history, message),
            options.history_k,
            None,
            max,
        )
        .await?;

    let mut references = Vec::new();
    push_unique(&mut references, titles_of(&direct));
    push_unique(&mut references, titles_of(&with_history));
    if references.is_empty() {
        tracing::info!("No notes within distance {}", options.max_cosine_distance);
        return Ok(ChatAnswer::NoReference(NO_REFERENCE_MESSAGE.to_string()));
    }

    let context = direct
        .iter()
        .chain(with_history.iter())
        .map(|h| h.record.document.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    answer(llm, prompt, &history, message, &context, references).await
}

/// Where graph chat collects its context from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphScope<'s> {
    pub start: Option<&'s str>,
    pub end: Option<&'s str>,
    pub hops: usize,
}

/// Answer from notes reached through the note graph.
///
/// Without a start note the closest note to the message is the start. With
/// only a start, notes within `hops` are used; with both ends, the notes on
/// the shortest path between them.
#[allow(clippy::too_many_arguments)]
pub async fn graph_chat(
    store: &dyn VectorStore,
    llm: &dyn LlmClient,
    prompt: &PromptDefinition,
    message: &str,
    history: &[ChatTurn],
    notes: &Notes,
    scope: GraphScope<'_>,
    options: &ChatOptions,
) -> AppResult<ChatAnswer> {
    let graph: UndirectedNoteGraph = build_graph(notes);

    let mut keys = match (scope.start, scope.end) {
        (Some(start), Some(end)) => match shortest_path(&graph, start, end) {
            PathOutcome::Found(path) => path,
            PathOutcome::NoPath => {
                return Ok(ChatAnswer::NoPath {
                    start: start.to_string(),
                    end: end.to_string(),
                })
            }
            PathOutcome::UnknownNote(key) => return Ok(ChatAnswer::UnknownNote(key)),
        },
        (start, _) => {
            let start = match start {
                Some(start) => start.to_string(),
                None => match closest_note_key(store, message, notes, options).await? {
                    Some(key) => key,
                    None => {
                        return Ok(ChatAnswer::NoReference(
                            NO_GRAPH_REFERENCE_MESSAGE.to_string(),
                        ))
                    }
                },
            };
            match bounded_traversal(&graph, &start, scope.hops) {
                Ok(visits) => {
                    tracing::info!(
                        "Found {} notes within {} hops of {}",
                        visits.len(),
                        scope.hops,
                        start
                    );
                    visits.into_iter().map(|v| v.key).collect()
                }
                Err(TraversalError::UnknownNote(key)) => return Ok(ChatAnswer::UnknownNote(key)),
            }
        }
    };
    keys.truncate(options.max_references);

    let context = keys
        .iter()
        .filter_map(|key| notes.get(key))
        .map(|note| note.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    answer(llm, prompt, &history_text(history), message, &context, keys).await
}

/// Key of the first note whose key contains the title of the nearest note.
async fn closest_note_key(
    store: &dyn VectorStore,
    message: &str,
    notes: &Notes,
    options: &ChatOptions,
) -> AppResult<Option<String>> {
    let hits = store
        .query(
            &options.notes_collection,
            message,
            1,
            None,
            Some(options.max_cosine_distance),
        )
        .await?;
    let Some(title) = hits.first().and_then(|h| h.record.meta_str("title")) else {
        return Ok(None);
    };
    Ok(notes.keys().find(|key| key.contains(title)).cloned())
}
