//! Response types for the API surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::report::ValidationReport;

/// Outcome of the five-stage agent chain.
///
/// `fields`, `tables` and `rules` are the fence-stripped raw stage outputs;
/// no schema is imposed on them. The validation report is the one typed,
/// rethresholded artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainResponse {
    pub doc_type: String,
    pub fields: String,
    pub tables: String,
    pub rules: String,
    pub validation: ValidationReport,
    pub processing_time_ms: u64,
}

/// One retrieved chunk backing a QA answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub content: String,
    pub similarity: f32,
    pub chunk_index: u32,
}

/// Answer to a retrieval QA request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResponse {
    pub answer: String,
    pub context: Vec<ContextSnippet>,
    /// Whether the chunk index was served from the cache.
    pub from_cache: bool,
    pub processing_time_ms: u64,
}

impl QaResponse {
    /// Response when retrieval surfaced nothing above the similarity floor.
    pub fn not_found(from_cache: bool, processing_time_ms: u64) -> Self {
        Self {
            answer: "The answer is not available in the provided document.".to_string(),
            context: Vec::new(),
            from_cache,
            processing_time_ms,
        }
    }
}

/// Acknowledgement for a stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResponse {
    pub success: bool,
    pub inserted_id: Uuid,
}
