//! Concrete LLM provider implementations.

pub mod gemini;
pub mod huggingface;
pub mod ollama;

pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaClient;
