//! LLM provider factory.
//!
//! Builds the client for a provider tag, resolving credentials from the
//! provider's own environment variable unless one is passed explicitly.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, HuggingFaceClient, OllamaClient};
use crate::types::ProviderType;
use noteweave_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "gemini", "huggingface")
/// * `model` - Model override; `None` picks the provider default
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key, takes precedence over the environment
///
/// # Errors
/// Returns error if the provider is unknown or its credential is missing.
pub fn create_client(
    provider: &str,
    model: Option<&str>,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;
    let model = model.unwrap_or(provider_type.default_model()).to_string();

    tracing::debug!(provider = provider_type.as_str(), %model, "creating LLM client");

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(OllamaClient::with_base_url(base_url, model)))
        }
        ProviderType::Gemini => {
            let key = resolve_key(provider_type, api_key)?;
            let mut client = GeminiClient::new(key, model);
            if let Some(endpoint) = endpoint {
                client = client.with_base_url(endpoint);
            }
            Ok(Arc::new(client))
        }
        ProviderType::HuggingFace => {
            let token = resolve_key(provider_type, api_key)?;
            let mut client = HuggingFaceClient::new(token, model);
            if let Some(endpoint) = endpoint {
                client = client.with_base_url(endpoint);
            }
            Ok(Arc::new(client))
        }
    }
}

fn resolve_key(provider: ProviderType, explicit: Option<&str>) -> AppResult<String> {
    if let Some(key) = explicit {
        return Ok(key.to_string());
    }
    let Some(var) = provider.credential_env() else {
        return Ok(String::new());
    };
    std::env::var(var).map_err(|_| {
        AppError::Config(format!(
            "{} provider requires an API key in {}",
            provider.as_str(),
            var
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.model(), "gemma3:1b");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint_and_model() {
        let client =
            create_client("ollama", Some("llama3.2"), Some("http://localhost:8080"), None)
                .unwrap();
        assert_eq!(client.model(), "llama3.2");
    }

    #[test]
    fn test_gemini_with_explicit_key() {
        let client = create_client("gemini", None, None, Some("k")).unwrap();
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_huggingface_with_explicit_key() {
        let client = create_client("huggingface", None, None, Some("t")).unwrap();
        assert_eq!(client.model(), "Qwen/Qwen2.5-72B-Instruct");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
