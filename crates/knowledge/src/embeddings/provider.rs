//! Embedding provider trait and factory.

use super::providers::{OllamaEmbedder, TrigramEmbedder};
use noteweave_core::config::EmbeddingSettings;
use noteweave_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Store("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from the configured settings.
///
/// `endpoint` is the Ollama base URL; ignored by the trigram backend.
pub async fn create_provider(
    settings: &EmbeddingSettings,
    endpoint: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramEmbedder::new(settings.dimensions))),
        "ollama" => {
            let embedder = OllamaEmbedder::connect(
                endpoint.unwrap_or(super::providers::ollama::DEFAULT_OLLAMA_URL),
                &settings.model,
                settings.dimensions,
            )
            .await?;
            Ok(Arc::new(embedder))
        }
        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            other
        ))),
    }
}
