//! docsift server binary.
//!
//! Run with: cargo run -p docsift --bin docsift-server

use docsift::config::{Backend, DocsiftConfig};
use docsift::providers::{GeminiClient, LlmProvider, OllamaClient};
use docsift::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docsift=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = DocsiftConfig::load(config_path.as_deref())?;

    tracing::info!("configuration loaded");
    tracing::info!("  - backend: {:?}", config.backend);
    tracing::info!("  - chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - retrieval top_k: {}", config.retrieval.top_k);

    probe_backend(&config).await;

    let server = Server::new(config)?;

    println!("docsift server starting...");
    println!("  API:    http://{}/api", server.address());
    println!("  Health: http://{}/health", server.address());
    println!();
    println!("Endpoints:");
    println!("  POST /api/parse     - Upload and process a document");
    println!("  POST /api/agents    - Run the agent chain");
    println!("  POST /api/validate  - Validate against rules");
    println!("  POST /api/query     - Ask a question");
    println!("  POST /api/store     - Persist a record");
    println!("  GET  /api/documents - List stored records");
    println!();

    server.start().await?;

    Ok(())
}

/// Check the configured model backend is reachable before serving; a failure
/// is a warning, not a startup error.
async fn probe_backend(config: &DocsiftConfig) {
    match config.backend {
        Backend::Gemini => match GeminiClient::new(&config.gemini, &config.llm) {
            Ok(client) => match LlmProvider::health_check(&client).await {
                Ok(true) => tracing::info!("Gemini API reachable"),
                _ => tracing::warn!("Gemini API not reachable; check the API key"),
            },
            Err(e) => tracing::warn!("Gemini client not configured: {e}"),
        },
        Backend::Ollama => match OllamaClient::new(&config.ollama, &config.llm) {
            Ok(client) => match LlmProvider::health_check(&client).await {
                Ok(true) => tracing::info!("Ollama reachable at {}", config.ollama.base_url),
                _ => {
                    tracing::warn!("Ollama not reachable at {}", config.ollama.base_url);
                    tracing::warn!("  1. Install: https://ollama.com/download");
                    tracing::warn!("  2. Start: ollama serve");
                    tracing::warn!(
                        "  3. Pull models: ollama pull {} && ollama pull {}",
                        config.ollama.embed_model,
                        config.ollama.generate_model
                    );
                }
            },
            Err(e) => tracing::warn!("Ollama client not configured: {e}"),
        },
    }
}
