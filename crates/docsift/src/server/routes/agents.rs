//! Agent chain endpoint.

use axum::{extract::State, Json};
use std::time::Instant;

use crate::agents::AgentChain;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::query::AgentsRequest;
use crate::types::response::ChainResponse;

/// POST /api/agents - Run the five-stage chain over document text.
pub async fn run_chain(
    State(state): State<AppState>,
    Json(request): Json<AgentsRequest>,
) -> Result<Json<ChainResponse>> {
    if request.text.trim().is_empty() {
        return Err(Error::BadRequest("text must not be empty".to_string()));
    }

    let start = Instant::now();

    let chain = AgentChain::new(state.llm(), &state.config().agents.work_dir);
    let outcome = chain.run(&request.text).await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!("agent chain finished in {}ms", processing_time_ms);

    Ok(Json(ChainResponse {
        doc_type: outcome.doc_type,
        fields: outcome.fields,
        tables: outcome.tables,
        rules: outcome.rules,
        validation: outcome.validation,
        processing_time_ms,
    }))
}
