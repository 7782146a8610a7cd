//! Local Ollama backend for generation and embeddings.

use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

use crate::config::{LlmConfig, OllamaConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    generate_model: String,
    embed_model: String,
    dimensions: usize,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig, llm: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            generate_model: config.generate_model.clone(),
            embed_model: config.embed_model.clone(),
            dimensions: config.dimensions,
            temperature: llm.temperature,
        })
    }

    async fn request_generate(&self, request: &GenerateRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "Ollama generation failed ({status}): {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("failed to parse Ollama response: {e}")))?;

        Ok(parsed.response.trim().to_string())
    }
}

#[derive(serde::Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    options: GenerateOptions,
}

#[derive(serde::Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(serde::Serialize)]
struct EmbeddingsRequest {
    model: String,
    prompt: String,
}

#[derive(serde::Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.generate_model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            images: None,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };
        self.request_generate(&request).await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &[u8],
        _mime_type: &str,
    ) -> Result<String> {
        // Requires a multimodal model (e.g. llava) configured as generate_model.
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let request = GenerateRequest {
            model: self.generate_model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            images: Some(vec![encoded]),
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };
        self.request_generate(&request).await
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Ollama health check failed: {e}")))?;
        Ok(response.status().is_success())
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.generate_model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingsRequest {
            model: self.embed_model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Ollama embed request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Ollama embedding failed ({status}): {body}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("failed to parse embeddings response: {e}")))?;

        Ok(parsed.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        LlmProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
