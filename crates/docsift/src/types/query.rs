//! Request types for the API surface.

use serde::{Deserialize, Serialize};

/// Request to run the five-stage agent chain over document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsRequest {
    pub text: String,
}

/// Request to validate document text against a caller-supplied rule list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub text: String,
    pub rules: Vec<String>,
}

/// Retrieval QA request over a specific document's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaRequest {
    pub document_text: String,
    pub question: String,

    /// Number of chunks to retrieve (defaults from config when absent).
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Minimum similarity for retrieved chunks (defaults from config).
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qa_request_defaults_are_optional() {
        let request: QaRequest = serde_json::from_str(
            r#"{"document_text": "some text", "question": "what is it?"}"#,
        )
        .unwrap();

        assert!(request.top_k.is_none());
        assert!(request.similarity_threshold.is_none());
    }
}
