//! Ad-hoc validation endpoint.

use axum::{extract::State, Json};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::query::ValidateRequest;
use crate::types::ValidationReport;
use crate::validation;

/// POST /api/validate - Check document text against a caller-supplied
/// rule list.
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidationReport>> {
    if request.rules.is_empty() {
        return Err(Error::BadRequest(
            "at least one rule is required".to_string(),
        ));
    }

    let report = validation::validate_document(state.llm(), &request.text, &request.rules).await?;
    Ok(Json(report))
}
