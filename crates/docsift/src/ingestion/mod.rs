//! Text extraction from uploaded files.

pub mod chunker;
pub mod images;
pub mod ocr;
pub mod parser;

pub use chunker::{TextChunk, TextChunker};
pub use images::extract_pdf_images;
pub use ocr::Ocr;
pub use parser::{FileParser, PageContent, ParsedDocument};
