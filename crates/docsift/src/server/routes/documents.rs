//! Document persistence endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::response::StoreResponse;
use crate::types::{DocumentRecord, StoredDocument, StoredDocumentSummary};

/// POST /api/store - Persist an assembled document record.
pub async fn store_document(
    State(state): State<AppState>,
    Json(document): Json<StoredDocument>,
) -> Result<Json<StoreResponse>> {
    let record = state.db().insert(&document)?;

    tracing::info!(
        "stored document {} ({}, type: {})",
        record.id,
        record.document.filename,
        record.document.doc_type.as_deref().unwrap_or("unknown")
    );

    Ok(Json(StoreResponse {
        success: true,
        inserted_id: record.id,
    }))
}

/// GET /api/documents - List stored documents, newest first.
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredDocumentSummary>>> {
    Ok(Json(state.db().list()?))
}

/// GET /api/documents/:id - Fetch one stored document.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentRecord>> {
    state
        .db()
        .get(&id)?
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("document {id}")))
}

/// DELETE /api/documents/:id - Delete one stored document.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    if state.db().delete(&id)? {
        Ok(Json(serde_json::json!({ "deleted": id })))
    } else {
        Err(Error::NotFound(format!("document {id}")))
    }
}
