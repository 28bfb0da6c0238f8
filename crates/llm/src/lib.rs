//! LLM integration crate for noteweave.
//!
//! Provider-agnostic access to the language models that write notes and
//! answer chat questions. Every provider implements [`LlmClient`]; the
//! [`create_client`] factory picks one by its [`ProviderType`] tag.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Gemini**: Google Generative Language API, key in `GEMINI_KEY`
//! - **HuggingFace**: Inference router chat completions, token in `HF_TOKEN`
//!
//! # Example
//! ```no_run
//! use noteweave_llm::{LlmClient, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new("gemma3:1b");
//! let answer = client.generate("You are terse.", "Hello, world!").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, HuggingFaceClient, OllamaClient};
pub use types::ProviderType;
