//! The upload pipeline: extract, clean, OCR embedded images, assemble.
//!
//! Data flows strictly left to right. Model output from the cleaning stage
//! is trusted verbatim; there is no hallucination check.

use base64::Engine;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::ingestion::{extract_pdf_images, FileParser, Ocr, ParsedDocument};
use crate::providers::LlmProvider;
use crate::types::{DocumentImage, FileFormat, ProcessedDocument};

/// Ask the model to normalise extraction artifacts without adding content.
fn cleanup_prompt(raw_text: &str) -> String {
    format!(
        "You are a text cleaner.\n\
         The following text has been extracted from a document. It contains \
         formatting issues, broken lines, and possibly incorrect characters. \
         Clean it up, fix spelling mistakes, and format it into a readable \
         version. Do not hallucinate content. Do not add any additional \
         information. Just return the cleaned text.\n\n\
         Extracted text:\n{raw_text}"
    )
}

/// Ask the model to correct OCR output against the original image.
fn ocr_correction_prompt(ocr_text: &str) -> String {
    format!(
        "You are a text cleaner.\n\
         The following text has been extracted from an image using OCR and \
         may contain recognition errors. Refine and correct it using the \
         attached image. Do not hallucinate content. Do not add any \
         additional information. Just return the text you see in the image.\n\n\
         Extracted text:\n{ocr_text}"
    )
}

/// Clean extracted text with the hosted model. Empty input short-circuits
/// without a model call.
pub async fn clean_text(llm: &dyn LlmProvider, raw_text: &str) -> Result<String> {
    if raw_text.trim().is_empty() {
        return Ok(String::new());
    }
    llm.generate(&cleanup_prompt(raw_text)).await
}

/// Correct OCR text against the original image pixels.
pub async fn correct_ocr_text(
    llm: &dyn LlmProvider,
    ocr_text: &str,
    image: &[u8],
    mime_type: &str,
) -> Result<String> {
    if ocr_text.trim().is_empty() {
        return Ok(String::new());
    }
    llm.generate_with_image(&ocr_correction_prompt(ocr_text), image, mime_type)
        .await
}

/// Run the full upload pipeline for one file.
///
/// Extraction dispatches on the declared extension and fails immediately for
/// unsupported formats. For PDFs, embedded JPEG images are OCR'd and
/// model-corrected individually; a failing image is skipped, never the
/// document.
pub async fn process_document(
    llm: &dyn LlmProvider,
    ocr: &Ocr,
    pdf_timeout: Duration,
    filename: &str,
    data: &[u8],
) -> Result<ProcessedDocument> {
    let extension = crate::ingestion::parser::extension_of(filename);
    let format = FileFormat::from_extension(&extension);

    if !format.is_supported() {
        return Err(Error::UnsupportedFormat(extension));
    }

    let parsed = match format {
        FileFormat::Image => {
            let text = ocr.image_to_text(data).await?;
            ParsedDocument::from_ocr_text(text)
        }
        _ => FileParser::parse(filename, data, pdf_timeout)?,
    };

    tracing::info!(
        "extracted {} characters from {} ({})",
        parsed.content.len(),
        filename,
        format.display_name()
    );

    let cleaned_text = clean_text(llm, &parsed.content).await?;

    // The uploaded image itself also goes through OCR correction.
    let mut images = Vec::new();
    if format == FileFormat::Image {
        let mime = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string();
        images.push(correct_image_with_ocr(llm, &parsed.content, data, &mime).await);
    }

    if format == FileFormat::Pdf {
        for (i, image_bytes) in extract_pdf_images(data).into_iter().enumerate() {
            let ocr_text = match ocr.image_to_text(&image_bytes).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("OCR failed for embedded image {}: {}, skipping", i, e);
                    continue;
                }
            };

            // Extracted DCTDecode streams are JPEG payloads.
            images.push(correct_image_with_ocr(llm, &ocr_text, &image_bytes, "image/jpeg").await);
        }
    }

    Ok(ProcessedDocument {
        filename: filename.to_string(),
        extension,
        extracted_text: parsed.content,
        cleaned_text,
        images,
        total_pages: parsed.total_pages,
        content_hash: parsed.content_hash,
    })
}

async fn correct_image_with_ocr(
    llm: &dyn LlmProvider,
    ocr_text: &str,
    image_bytes: &[u8],
    mime: &str,
) -> DocumentImage {
    // A correction failure falls back to the raw OCR reading.
    let corrected_text = match correct_ocr_text(llm, ocr_text, image_bytes, mime).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("OCR correction failed: {}, keeping raw OCR text", e);
            ocr_text.to_string()
        }
    };

    DocumentImage {
        image_base64: base64::engine::general_purpose::STANDARD.encode(image_bytes),
        ocr_text: ocr_text.to_string(),
        corrected_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("cleaned output".to_string())
        }

        async fn generate_with_image(
            &self,
            _prompt: &str,
            _image: &[u8],
            _mime: &str,
        ) -> Result<String> {
            Ok("corrected output".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }
    }

    #[tokio::test]
    async fn empty_text_skips_the_model_call() {
        let cleaned = clean_text(&EchoLlm, "   ").await.unwrap();
        assert_eq!(cleaned, "");

        let corrected = correct_ocr_text(&EchoLlm, "", b"img", "image/png")
            .await
            .unwrap();
        assert_eq!(corrected, "");
    }

    #[tokio::test]
    async fn unsupported_extension_fails_before_any_model_call() {
        let err = process_document(
            &EchoLlm,
            &Ocr::default(),
            Duration::from_secs(1),
            "malware.exe",
            b"MZ",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::UnsupportedFormat(ext) if ext == "exe"));
    }

    #[tokio::test]
    async fn txt_upload_produces_cleaned_document() {
        let doc = process_document(
            &EchoLlm,
            &Ocr::default(),
            Duration::from_secs(1),
            "letter.txt",
            b"Dear sir, the amount is due.",
        )
        .await
        .unwrap();

        assert_eq!(doc.extension, "txt");
        assert_eq!(doc.extracted_text, "Dear sir, the amount is due.");
        assert_eq!(doc.cleaned_text, "cleaned output");
        assert!(doc.images.is_empty());
        assert!(!doc.content_hash.is_empty());
    }
}
