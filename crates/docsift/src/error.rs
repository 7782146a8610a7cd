//! Error taxonomy for the pipeline and its HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The declared extension maps to no known extractor.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse {filename}: {reason}")]
    FileParse { filename: String, reason: String },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// The hosted model returned output a stage contract could not parse.
    /// Carries the raw model text so the caller can inspect it.
    #[error("model returned unparseable output: {reason}")]
    ModelResponse { reason: String, raw: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn file_parse(filename: impl Into<String>, reason: impl ToString) -> Self {
        Self::FileParse {
            filename: filename.into(),
            reason: reason.to_string(),
        }
    }

    pub fn model_response(reason: impl ToString, raw: impl Into<String>) -> Self {
        Self::ModelResponse {
            reason: reason.to_string(),
            raw: raw.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::FileParse { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Llm(_) | Self::Embedding(_) | Self::ModelResponse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Self::Ocr(_)
            | Self::Storage(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::FileParse { .. } => "FILE_PARSE",
            Self::Ocr(_) => "OCR",
            Self::Llm(_) => "LLM",
            Self::Embedding(_) => "EMBEDDING",
            Self::ModelResponse { .. } => "MODEL_RESPONSE",
            Self::Storage(_) => "STORAGE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

/// Structured error body returned to API consumers.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    /// Raw model output, present only for `MODEL_RESPONSE` errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let raw = match &self {
            Self::ModelResponse { raw, .. } => Some(raw.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
                raw,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_maps_to_415() {
        let err = Error::UnsupportedFormat("xyz".to_string());
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn model_response_carries_raw_output() {
        let err = Error::model_response("expected JSON", "not json at all");
        match err {
            Error::ModelResponse { raw, .. } => assert_eq!(raw, "not json at all"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
