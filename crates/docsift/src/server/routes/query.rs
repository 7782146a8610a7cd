//! Retrieval QA endpoint.

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::retrieval;
use crate::server::state::AppState;
use crate::types::query::QaRequest;
use crate::types::response::QaResponse;

/// POST /api/query - Answer a question against the supplied document text.
pub async fn query_document(
    State(state): State<AppState>,
    Json(request): Json<QaRequest>,
) -> Result<Json<QaResponse>> {
    let start = Instant::now();

    tracing::info!("query: \"{}\"", request.question);

    let mut response = retrieval::answer_question(
        state.embedder(),
        state.llm(),
        state.chunker(),
        state.index_cache(),
        &state.config().retrieval,
        &request.document_text,
        &request.question,
        request.top_k,
        request.similarity_threshold,
    )
    .await?;

    response.processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "query answered in {}ms ({} context chunks, cache {})",
        response.processing_time_ms,
        response.context.len(),
        if response.from_cache { "hit" } else { "miss" }
    );

    Ok(Json(response))
}
