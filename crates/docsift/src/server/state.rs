//! Shared application state.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::{Backend, DocsiftConfig};
use crate::error::Result;
use crate::ingestion::{Ocr, TextChunker};
use crate::providers::{EmbeddingProvider, GeminiClient, LlmProvider, OllamaClient};
use crate::retrieval::IndexCache;
use crate::storage::DocumentDb;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DocsiftConfig,
    llm: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    ocr: Ocr,
    chunker: TextChunker,
    index_cache: IndexCache,
    db: DocumentDb,
    ready: RwLock<bool>,
}

impl AppState {
    pub fn new(config: DocsiftConfig) -> Result<Self> {
        tracing::info!("initializing application state (backend: {:?})", config.backend);

        let (llm, embedder): (Arc<dyn LlmProvider>, Arc<dyn EmbeddingProvider>) =
            match config.backend {
                Backend::Gemini => {
                    let client = Arc::new(GeminiClient::new(&config.gemini, &config.llm)?);
                    tracing::info!(
                        "Gemini backend (generation: {}, embeddings: {})",
                        config.gemini.generate_model,
                        config.gemini.embed_model
                    );
                    let llm: Arc<dyn LlmProvider> = client.clone();
                    let embedder: Arc<dyn EmbeddingProvider> = client;
                    (llm, embedder)
                }
                Backend::Ollama => {
                    let client = Arc::new(OllamaClient::new(&config.ollama, &config.llm)?);
                    tracing::info!(
                        "Ollama backend at {} (generation: {}, embeddings: {})",
                        config.ollama.base_url,
                        config.ollama.generate_model,
                        config.ollama.embed_model
                    );
                    let llm: Arc<dyn LlmProvider> = client.clone();
                    let embedder: Arc<dyn EmbeddingProvider> = client;
                    (llm, embedder)
                }
            };

        let db = DocumentDb::new(&config.storage.database_path)?;
        tracing::info!(
            "document store at {}",
            config.storage.database_path.display()
        );

        let index_cache = IndexCache::new(
            config.retrieval.cache_max_entries,
            config.retrieval.cache_ttl_secs,
        );
        let chunker = TextChunker::from_config(&config.chunking);
        let ocr = Ocr::new(config.ingest.ocr_language.clone());

        if !Ocr::is_available() {
            tracing::warn!(
                "tesseract not found; image uploads and embedded-image OCR will fail \
                 (apt install tesseract-ocr)"
            );
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                llm,
                embedder,
                ocr,
                chunker,
                index_cache,
                db,
                ready: RwLock::new(true),
            }),
        })
    }

    /// Test-oriented constructor wiring explicit providers and an in-memory
    /// database.
    #[cfg(test)]
    pub fn for_tests(
        config: DocsiftConfig,
        llm: Arc<dyn LlmProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let index_cache = IndexCache::new(
            config.retrieval.cache_max_entries,
            config.retrieval.cache_ttl_secs,
        );
        let chunker = TextChunker::from_config(&config.chunking);
        let ocr = Ocr::new(config.ingest.ocr_language.clone());
        let db = DocumentDb::in_memory().expect("in-memory db");

        Self {
            inner: Arc::new(AppStateInner {
                config,
                llm,
                embedder,
                ocr,
                chunker,
                index_cache,
                db,
                ready: RwLock::new(true),
            }),
        }
    }

    pub fn config(&self) -> &DocsiftConfig {
        &self.inner.config
    }

    pub fn llm(&self) -> &dyn LlmProvider {
        self.inner.llm.as_ref()
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.inner.embedder.as_ref()
    }

    pub fn ocr(&self) -> &Ocr {
        &self.inner.ocr
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.inner.chunker
    }

    pub fn index_cache(&self) -> &IndexCache {
        &self.inner.index_cache
    }

    pub fn db(&self) -> &DocumentDb {
        &self.inner.db
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
