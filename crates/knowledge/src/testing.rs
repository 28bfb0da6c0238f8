//! Test doubles shared by the unit tests of this crate.

use crate::embeddings::providers::TrigramEmbedder;
use crate::embeddings::EmbeddingProvider;
use crate::store::SqliteStore;
use noteweave_core::{AppError, AppResult};
use noteweave_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Embedder returning preset vectors; unknown texts map to the first axis.
#[derive(Debug)]
pub struct FixedEmbedder {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                self.vectors.get(t).cloned().unwrap_or_else(|| {
                    let mut v = vec![0.0; self.dimensions];
                    v[0] = 1.0;
                    v
                })
            })
            .collect())
    }
}

/// LLM that replays scripted replies in order and records every prompt.
///
/// `Err` entries surface as `AppError::Llm`; an exhausted script fails too.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub calls: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call answers with `reply`.
    pub fn always(reply: &str, times: usize) -> Self {
        Self::new(std::iter::repeat(Ok(reply.to_string())).take(times))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
            }),
            Some(Err(message)) => Err(AppError::Llm(message)),
            None => Err(AppError::Llm("script exhausted".to_string())),
        }
    }
}

/// In-memory store over the trigram embedder.
pub fn trigram_store() -> SqliteStore {
    SqliteStore::in_memory(Arc::new(TrigramEmbedder::new(256))).unwrap()
}

/// A well-formed fenced JSON reply from the note prompt.
pub fn note_reply(title: &str) -> String {
    format!(
        "Here you go:\n```json\n{{\"title\": \"{}\", \"detailed_explanation\": \"Body of {}.\", \
         \"tables\": \"\", \"reference image\": \"\", \"important_snippets\": \"\", \
         \"tags\": \"#topic\", \"simple_explanation\": \"Easy words.\"}}\n```",
        title, title
    )
}
