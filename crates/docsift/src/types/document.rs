//! Document records flowing through the pipeline and into storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File formats the ingestion stage knows how to extract text from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    Docx,
    Pptx,
    Txt,
    Markdown,
    /// Raster image handed to OCR.
    Image,
    Unknown,
}

impl FileFormat {
    /// Detect format from a lowercase file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "pptx" => Self::Pptx,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tiff" | "tif" => Self::Image,
            _ => Self::Unknown,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Pptx => "PowerPoint (.pptx)",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Image => "Image",
            Self::Unknown => "Unknown",
        }
    }
}

/// An image embedded in (or uploaded as) a document, with its OCR readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentImage {
    /// Raw image bytes, base64-encoded for transport.
    pub image_base64: String,
    /// Text as read by OCR, uncorrected.
    pub ocr_text: String,
    /// OCR text after model correction.
    pub corrected_text: String,
}

/// Output of the upload pipeline: extraction plus cleanup, before any
/// agent-chain analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub filename: String,
    pub extension: String,
    /// Text exactly as extracted from the file.
    pub extracted_text: String,
    /// Model-normalized text; trusted verbatim downstream.
    pub cleaned_text: String,
    /// Embedded images with per-image OCR, PDF only.
    pub images: Vec<DocumentImage>,
    pub total_pages: Option<u32>,
    /// SHA-256 of the extracted text.
    pub content_hash: String,
}

/// The assembled result a client submits for persistence. Immutable once
/// stored; the store stamps identifier and timestamp on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub filename: String,
    pub extension: String,
    /// Classification label from the agent chain.
    #[serde(default)]
    pub doc_type: Option<String>,
    pub content: String,
    pub clean_content: String,
    #[serde(default)]
    pub images: Vec<DocumentImage>,
    /// Key/value fields as produced by the field extractor (opaque JSON).
    #[serde(default)]
    pub fields: serde_json::Value,
    /// Tables as produced by the table extractor (opaque JSON).
    #[serde(default)]
    pub tables: serde_json::Value,
    /// Suggested validation rules (opaque JSON).
    #[serde(default)]
    pub rules: serde_json::Value,
    #[serde(default)]
    pub validation: Option<crate::types::report::ValidationReport>,
}

/// A stored document with its generated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub document: StoredDocument,
}

/// Listing row: enough to render an index without the payload columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocumentSummary {
    pub id: Uuid,
    pub filename: String,
    pub doc_type: Option<String>,
    pub created_at: DateTime<Utc>,
}
