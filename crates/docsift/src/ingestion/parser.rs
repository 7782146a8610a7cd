//! Multi-format file parser.
//!
//! Dispatches on the declared extension. PDF extraction runs on a helper
//! thread with a deadline because pdf-extract can hang on pathological
//! fonts; when it fails or times out, a lopdf content-stream walk takes
//! over.

use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileFormat;

/// Content from a single page or slide.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-indexed page number.
    pub page_number: u32,
    pub content: String,
}

/// A parsed document with extracted text and metadata.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub format: FileFormat,
    /// Full extracted text.
    pub content: String,
    /// SHA-256 of the extracted text.
    pub content_hash: String,
    pub total_pages: Option<u32>,
    pub pages: Vec<PageContent>,
}

impl ParsedDocument {
    fn single_page(format: FileFormat, content: String) -> Self {
        let pages = vec![PageContent {
            page_number: 1,
            content: content.clone(),
        }];
        Self {
            content_hash: hash_content(&content),
            format,
            content,
            total_pages: None,
            pages,
        }
    }

    /// Wrap OCR output of an uploaded image as a parsed document.
    pub fn from_ocr_text(content: String) -> Self {
        Self::single_page(FileFormat::Image, content)
    }
}

/// Multi-format file parser.
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension.
    ///
    /// Image formats are not handled here; they go through [`crate::ingestion::Ocr`]
    /// because OCR shells out asynchronously.
    pub fn parse(filename: &str, data: &[u8], pdf_timeout: Duration) -> Result<ParsedDocument> {
        let extension = extension_of(filename);
        let format = FileFormat::from_extension(&extension);

        if !format.is_supported() {
            return Err(Error::UnsupportedFormat(extension));
        }

        match format {
            FileFormat::Pdf => Self::parse_pdf(filename, data, pdf_timeout),
            FileFormat::Docx => Self::parse_docx(filename, data),
            FileFormat::Pptx => Self::parse_pptx(filename, data),
            FileFormat::Txt | FileFormat::Markdown => Ok(ParsedDocument::single_page(
                format,
                String::from_utf8_lossy(data).trim().to_string(),
            )),
            FileFormat::Image => Err(Error::Internal(
                "image files are extracted via OCR, not the file parser".to_string(),
            )),
            FileFormat::Unknown => Err(Error::UnsupportedFormat(extension)),
        }
    }

    fn parse_pdf(filename: &str, data: &[u8], timeout: Duration) -> Result<ParsedDocument> {
        let content = Self::extract_pdf_text(filename, data, timeout)?;
        let content = normalize_extracted_text(&content);

        if content.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "no text content could be extracted; the PDF may be image-based",
            ));
        }

        let total_pages = match lopdf::Document::load_mem(data) {
            Ok(doc) => Some(doc.get_pages().len() as u32),
            Err(_) => Some(1),
        };

        let mut parsed = ParsedDocument::single_page(FileFormat::Pdf, content);
        parsed.total_pages = total_pages;
        Ok(parsed)
    }

    /// Run pdf-extract under a deadline; fall back to lopdf on error/timeout.
    fn extract_pdf_text(filename: &str, data: &[u8], timeout: Duration) -> Result<String> {
        use std::sync::mpsc;

        let owned = data.to_vec();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let _ = tx.send(pdf_extract::extract_text_from_mem(&owned));
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed for {}: {}, using fallback", filename, e);
                Self::extract_pdf_text_fallback(filename, data)
            }
            Err(_) => {
                // The extraction thread may still be running; it is detached.
                tracing::warn!(
                    "PDF extraction exceeded {}s for {}, using fallback",
                    timeout.as_secs(),
                    filename
                );
                Self::extract_pdf_text_fallback(filename, data)
            }
        }
    }

    /// Minimal text recovery straight from lopdf content streams.
    fn extract_pdf_text_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("failed to load PDF: {e}")))?;

        let mut text = String::new();
        for (page_num, page_id) in doc.get_pages() {
            match doc.get_page_content(page_id) {
                Ok(content) => {
                    let page_text = text_from_content_stream(&content);
                    if !page_text.trim().is_empty() {
                        text.push_str(&format!("\n--- Page {page_num} ---\n"));
                        text.push_str(&page_text);
                    }
                }
                Err(e) => {
                    tracing::debug!("no content for page {}: {}", page_num, e);
                }
            }
        }

        if text.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "PDF has no extractable text; it may be image-based or encrypted",
            ));
        }

        Ok(text)
    }

    fn parse_docx(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc =
            docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
                for child in paragraph.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(text) = child {
                                content.push_str(&text.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        if content.trim().is_empty() {
            return Err(Error::file_parse(filename, "document contains no text"));
        }

        Ok(ParsedDocument::single_page(FileFormat::Docx, content))
    }

    fn parse_pptx(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        use std::io::Read;

        let cursor = std::io::Cursor::new(data);
        let mut archive =
            zip::ZipArchive::new(cursor).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        // Slide entries are ppt/slides/slideN.xml; order by N.
        let mut slide_names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .map(str::to_string)
            .collect();
        slide_names.sort_by_key(|name| slide_number(name));

        let mut content = String::new();
        let mut pages = Vec::new();

        for (i, slide_name) in slide_names.iter().enumerate() {
            let slide_no = i as u32 + 1;
            let mut xml = String::new();
            if let Ok(mut file) = archive.by_name(slide_name) {
                if file.read_to_string(&mut xml).is_err() {
                    continue;
                }
            }

            let slide_text = slide_text_from_xml(&xml);
            if slide_text.is_empty() {
                continue;
            }

            content.push_str(&format!("Slide {slide_no}:\n{slide_text}\n\n"));
            pages.push(PageContent {
                page_number: slide_no,
                content: slide_text,
            });
        }

        if content.trim().is_empty() {
            return Err(Error::file_parse(filename, "presentation contains no text"));
        }

        let total = pages.len() as u32;
        Ok(ParsedDocument {
            content_hash: hash_content(&content),
            format: FileFormat::Pptx,
            content,
            total_pages: Some(total),
            pages,
        })
    }
}

/// Pull the lowercase extension off a filename.
pub fn extension_of(filename: &str) -> String {
    filename.rsplit('.').next().unwrap_or("").to_lowercase()
}

fn slide_number(name: &str) -> u32 {
    name.trim_start_matches("ppt/slides/slide")
        .trim_end_matches(".xml")
        .parse()
        .unwrap_or(0)
}

/// Extract text runs (`<a:t>`) from a slide's XML.
fn slide_text_from_xml(xml: &str) -> String {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parts: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(e)) if in_text => {
                if let Ok(text) = e.unescape() {
                    let trimmed = text.trim().to_string();
                    if !trimmed.is_empty() {
                        parts.push(trimmed);
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text = false,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    parts.join(" ")
}

/// Recover text show operators (`Tj`/`TJ` between `BT`/`ET`) from a raw PDF
/// content stream. Best-effort: only literal-string arguments are decoded.
fn text_from_content_stream(content: &[u8]) -> String {
    let stream = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in stream.lines() {
        let line = line.trim();
        match line {
            "BT" => in_text_block = true,
            "ET" => {
                in_text_block = false;
                text.push(' ');
            }
            _ if in_text_block && (line.ends_with("Tj") || line.ends_with("TJ")) => {
                if let (Some(start), Some(end)) = (line.find('('), line.rfind(')')) {
                    if start < end {
                        let literal = &line[start + 1..end];
                        text.push_str(&decode_pdf_string(literal));
                    }
                }
            }
            _ => {}
        }
    }

    text
}

fn decode_pdf_string(s: &str) -> String {
    s.replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\(", "(")
        .replace("\\)", ")")
        .replace("\\\\", "\\")
}

/// Normalize extraction artifacts: map typographic characters and ligatures
/// to ASCII, drop nulls, and collapse blank lines.
fn normalize_extracted_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\0' => {}
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' => out.push('-'),
            '\u{2014}' | '\u{2015}' => out.push_str("--"),
            '\u{2018}' | '\u{2019}' | '\u{201A}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' => out.push('"'),
            '\u{2022}' => out.push_str("* "),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' => out.push(' '),
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            other => out.push(other),
        }
    }

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hash content for deduplication and cache keys.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unsupported_extension_fails_immediately() {
        let err = FileParser::parse("archive.tar", b"data", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ext) if ext == "tar"));
    }

    #[test]
    fn txt_files_parse_to_single_page() {
        let parsed =
            FileParser::parse("notes.txt", b"  hello world  ", Duration::from_secs(1)).unwrap();
        assert_eq!(parsed.content, "hello world");
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.format, FileFormat::Txt);
    }

    #[test]
    fn identical_content_hashes_identically() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abc "));
    }

    #[test]
    fn normalization_maps_typographic_chars() {
        let normalized = normalize_extracted_text("\u{201C}caf\u{00E9}\u{201D}\u{2014}\u{FB01}ne");
        assert_eq!(normalized, "\"caf\u{00E9}\"--fine");
    }

    #[test]
    fn normalization_collapses_blank_lines() {
        let normalized = normalize_extracted_text("a\n\n\n  b  \n\nc");
        assert_eq!(normalized, "a\nb\nc");
    }

    #[test]
    fn content_stream_text_recovery() {
        let stream = b"BT\n(Hello) Tj\n(World) Tj\nET\n";
        let text = text_from_content_stream(stream);
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
    }

    #[test]
    fn pptx_slides_extract_in_order() {
        let slide = |body: &str| {
            format!(
                r#"<?xml version="1.0"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{body}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
            )
        };

        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("ppt/slides/slide1.xml", options).unwrap();
            writer.write_all(slide("first slide").as_bytes()).unwrap();
            writer.start_file("ppt/slides/slide2.xml", options).unwrap();
            writer.write_all(slide("second slide").as_bytes()).unwrap();
            writer.finish().unwrap();
        }

        let parsed =
            FileParser::parse("deck.pptx", buf.get_ref(), Duration::from_secs(1)).unwrap();
        assert_eq!(parsed.total_pages, Some(2));
        let first = parsed.content.find("first slide").unwrap();
        let second = parsed.content.find("second slide").unwrap();
        assert!(first < second);
    }
}
