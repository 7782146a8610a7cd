//! Provider abstractions for hosted-model generation and embeddings.
//!
//! Trait objects let the service switch between the hosted Gemini backend
//! and a local Ollama server without touching the pipeline code.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiClient;
pub use llm::LlmProvider;
pub use ollama::OllamaClient;
