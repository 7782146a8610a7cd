//! Request, response, and record types.

pub mod document;
pub mod query;
pub mod report;
pub mod response;

pub use document::{
    DocumentImage, DocumentRecord, FileFormat, ProcessedDocument, StoredDocument,
    StoredDocumentSummary,
};
pub use report::{RuleResult, RuleStatus, ValidationReport, Validity};
