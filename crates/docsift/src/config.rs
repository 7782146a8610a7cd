//! Configuration for the document intelligence service.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Top-level service configuration.
///
/// Every section has serde defaults so a partial TOML file (or none at all)
/// yields a working local setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsiftConfig {
    /// Which model backend serves generation and embeddings.
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub agents: AgentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl DocsiftConfig {
    /// Load configuration from a TOML file, falling back to defaults when no
    /// path is given. The `DOCSIFT_CONFIG` environment variable names the
    /// file when the caller passes `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os("DOCSIFT_CONFIG").map(PathBuf::from),
        };

        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                toml::from_str(&raw)
                    .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
            }
            None => Ok(Self::default()),
        }
    }
}

/// Model backend selection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hosted Gemini API (requires an API key).
    #[default]
    Gemini,
    /// Local Ollama server.
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    /// Maximum multipart upload size in bytes.
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Knobs shared by every model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Sampling temperature for generation.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries for transient request failures.
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; falls back to the `GEMINI_API_KEY` environment variable.
    pub api_key: Option<String>,
    pub base_url: String,
    pub generate_model: String,
    pub embed_model: String,
    /// Embedding vector width for the configured embed model.
    pub dimensions: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            generate_model: "gemini-2.5-flash".to_string(),
            embed_model: "text-embedding-004".to_string(),
            dimensions: 768,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub generate_model: String,
    pub embed_model: String,
    pub dimensions: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            dimensions: 768,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Wall-clock limit for PDF text extraction before the lopdf fallback runs.
    pub pdf_timeout_secs: u64,
    /// OCR language passed to tesseract.
    pub ocr_language: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            pdf_timeout_secs: 60,
            ocr_language: "eng".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Chunks shorter than this are dropped.
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            min_chunk_size: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Minimum cosine similarity for a chunk to reach the prompt.
    pub similarity_threshold: f32,
    /// Upper bound on cached chunk indexes.
    pub cache_max_entries: usize,
    /// Cache entry lifetime in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            similarity_threshold: 0.2,
            cache_max_entries: 64,
            cache_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Directory where chain stages persist their output files.
    pub work_dir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            work_dir: data_dir().join("agent-runs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file for stored document records.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: data_dir().join("documents.db"),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docsift")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_gemini_backend() {
        let config = DocsiftConfig::default();
        assert_eq!(config.backend, Backend::Gemini);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.chunking.chunk_size, 500);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: DocsiftConfig = toml::from_str(
            r#"
            backend = "ollama"

            [server]
            host = "127.0.0.1"
            port = 9000
            enable_cors = false
            max_upload_size = 1048576
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::Ollama);
        assert_eq!(config.server.port, 9000);
        // Untouched sections keep their defaults.
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.llm.max_retries, 2);
    }
}
