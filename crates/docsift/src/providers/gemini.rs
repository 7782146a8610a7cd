//! Gemini client for generation and embeddings.
//!
//! Talks to the Generative Language API with an API key. Transient failures
//! (network errors, 429s, 5xx) are retried with a short backoff.

use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

use crate::config::{GeminiConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    generate_model: String,
    embed_model: String,
    dimensions: usize,
    temperature: f32,
    max_retries: u32,
}

impl GeminiClient {
    /// Create a client; the API key comes from config or `GEMINI_API_KEY`.
    pub fn new(config: &GeminiConfig, llm: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                Error::Config(
                    "no Gemini API key: set gemini.api_key or the GEMINI_API_KEY environment variable"
                        .to_string(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            generate_model: config.generate_model.clone(),
            embed_model: config.embed_model.clone(),
            dimensions: config.dimensions,
            temperature: llm.temperature,
            max_retries: llm.max_retries,
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.generate_model, self.api_key
        )
    }

    fn embed_url(&self) -> String {
        format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.embed_model, self.api_key
        )
    }

    async fn generate_content(&self, parts: Vec<Part>) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: 8192,
            },
        };

        let mut attempt = 0u32;
        loop {
            match self.try_generate(&request).await {
                Ok(text) => return Ok(text),
                Err((err, retryable)) if retryable && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Gemini request failed (attempt {}/{}): {}",
                        attempt,
                        self.max_retries,
                        err
                    );
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                }
                Err((err, _)) => return Err(err),
            }
        }
    }

    /// One generation attempt. The bool marks whether a retry is worthwhile.
    async fn try_generate(&self, request: &GenerateRequest) -> std::result::Result<String, (Error, bool)> {
        let response = self
            .client
            .post(self.generate_url())
            .json(request)
            .send()
            .await
            .map_err(|e| (Error::Llm(format!("Gemini request failed: {e}")), true))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let retryable = status.is_server_error() || status.as_u16() == 429;
            return Err((
                Error::Llm(format!("Gemini generation failed ({status}): {body}")),
                retryable,
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| (Error::Llm(format!("failed to parse Gemini response: {e}")), false))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|t| t.trim().to_string())
            .ok_or_else(|| (Error::Llm("no text in Gemini response".to_string()), false))
    }
}

#[derive(serde::Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

/// A content part: plain text or inline binary data, never both.
#[derive(serde::Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline_data(mime_type: &str, data: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(data),
            }),
        }
    }
}

#[derive(serde::Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(serde::Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(serde::Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(serde::Serialize)]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
}

#[derive(serde::Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(serde::Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(serde::Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(serde::Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_content(vec![Part::text(prompt)]).await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String> {
        self.generate_content(vec![
            Part::text(prompt),
            Part::inline_data(mime_type, image),
        ])
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models?key={}", self.base_url, self.api_key);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Gemini health check failed: {e}")))?;
        Ok(response.status().is_success())
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.generate_model
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: format!("models/{}", self.embed_model),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
        };

        let response = self
            .client
            .post(self.embed_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Gemini embed request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Gemini embedding failed ({status}): {body}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("failed to parse embed response: {e}")))?;

        Ok(parsed.embedding.values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        LlmProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_part_serializes_without_inline_data() {
        let part = Part::text("hello");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json, serde_json::json!({"text": "hello"}));
    }

    #[test]
    fn inline_data_part_is_base64() {
        let part = Part::inline_data("image/png", &[1, 2, 3]);
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["inlineData"]["data"], "AQID");
    }
}
