//! API routes.

pub mod agents;
pub mod documents;
pub mod ingest;
pub mod query;
pub mod validate;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload + extraction + cleanup
        .route(
            "/parse",
            post(ingest::parse_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Five-stage agent chain
        .route("/agents", post(agents::run_chain))
        // Ad-hoc validation
        .route("/validate", post(validate::validate))
        // Retrieval QA
        .route("/query", post(query::query_document))
        // Persistence
        .route("/store", post(documents::store_document))
        .route("/documents", get(documents::list_documents))
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id", delete(documents::delete_document))
        // Info
        .route("/info", get(info))
}

async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "docsift",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document intelligence service: extraction, cleanup, agent-chain analysis, validation, and retrieval QA",
        "endpoints": {
            "POST /api/parse": "Upload a file; extract, clean, and OCR embedded images",
            "POST /api/agents": "Run the five-stage agent chain over document text",
            "POST /api/validate": "Validate document text against a rule list",
            "POST /api/query": "Ask a question against document text",
            "POST /api/store": "Persist an assembled document record",
            "GET /api/documents": "List stored documents",
            "GET /api/documents/:id": "Fetch a stored document",
            "DELETE /api/documents/:id": "Delete a stored document"
        }
    }))
}
