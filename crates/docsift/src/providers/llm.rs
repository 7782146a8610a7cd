//! LLM provider trait for text generation.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for prompt-in, text-out generation against a hosted or local model.
///
/// Implementations:
/// - `GeminiClient`: hosted Gemini API
/// - `OllamaClient`: local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a text prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a completion for a prompt accompanied by an image
    /// (used for OCR correction against the original pixels).
    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String>;

    /// Check if the provider is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging.
    fn name(&self) -> &str;

    /// The model serving generation requests.
    fn model(&self) -> &str;
}
