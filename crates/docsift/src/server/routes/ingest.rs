//! File upload and extraction endpoint.

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pipeline;
use crate::server::state::AppState;
use crate::types::ProcessedDocument;

/// POST /api/parse - Upload a file and run the extraction + cleanup pipeline.
///
/// Expects one multipart field carrying the file; the declared filename's
/// extension selects the extractor.
pub async fn parse_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessedDocument>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("failed to read multipart field: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(format!("failed to read file payload: {e}")))?;

        tracing::info!("processing upload: {} ({} bytes)", filename, data.len());

        let pdf_timeout = Duration::from_secs(state.config().ingest.pdf_timeout_secs);
        let document =
            pipeline::process_document(state.llm(), state.ocr(), pdf_timeout, &filename, &data)
                .await?;

        return Ok(Json(document));
    }

    Err(Error::BadRequest(
        "multipart request contained no file field".to_string(),
    ))
}
