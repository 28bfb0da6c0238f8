//! Offline embedder built from hashed word and character-trigram features.

use crate::embeddings::provider::EmbeddingProvider;
use noteweave_core::AppResult;
use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Deterministic, content-dependent vectors without a model server.
///
/// Each kept word contributes its own bucket plus one bucket per padded
/// character trigram. Output is unit length, or all zeros for text with no
/// usable words. Image tokens and markdown punctuation are ignored.
#[derive(Debug)]
pub struct TrigramEmbedder {
    dimensions: usize,
}

impl TrigramEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn words(text: &str) -> HashMap<String, u32> {
        let mut freq = HashMap::new();
        for raw in crate::images::strip_tokens(text).split_whitespace() {
            let word: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.chars().count() <= 2 || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            *freq.entry(word).or_insert(0) += 1;
        }
        freq
    }

    fn bucket(&self, feature: &str) -> usize {
        // FNV-1a
        let hash = feature
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
                (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
            });
        (hash % self.dimensions as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for (word, freq) in Self::words(text) {
            let weight = freq as f32;
            embedding[self.bucket(&word)] += weight;

            let padded: Vec<char> = std::iter::once('^')
                .chain(word.chars())
                .chain(std::iter::once('$'))
                .collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram)] += weight.sqrt();
            }
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }
        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramEmbedder {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_unit_length_and_dimensions() {
        let provider = TrigramEmbedder::new(384);
        let embedding = provider.embed("neurons fire in the cortex").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic_and_content_dependent() {
        let provider = TrigramEmbedder::new(128);
        let a = provider.embed("synaptic plasticity").await.unwrap();
        let b = provider.embed("synaptic plasticity").await.unwrap();
        let c = provider.embed("gradient descent").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_case_and_punctuation_insensitive() {
        let provider = TrigramEmbedder::new(128);
        let a = provider.embed("**Hebbian** learning!").await.unwrap();
        let b = provider.embed("hebbian LEARNING").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_image_tokens_ignored() {
        let provider = TrigramEmbedder::new(128);
        let a = provider
            .embed("retina <reference image 1700000000000_abc> model")
            .await
            .unwrap();
        let b = provider.embed("retina model").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = TrigramEmbedder::new(64);
        let embedding = provider.embed("a of to").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_utf8_safety() {
        let provider = TrigramEmbedder::new(64);
        let embedding = provider
            .embed("Gamedex é um aplicativo 🎮 brasileiro")
            .await
            .unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
