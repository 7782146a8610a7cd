//! OCR via the external tesseract binary.

use tokio::process::Command;

use crate::error::{Error, Result};

/// Wrapper around the `tesseract` CLI.
#[derive(Debug, Clone)]
pub struct Ocr {
    language: String,
}

impl Ocr {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    /// Check whether tesseract is installed.
    pub fn is_available() -> bool {
        std::process::Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Run OCR over raw image bytes, returning the recognized text
    /// (possibly empty for an image with no legible text).
    pub async fn image_to_text(&self, data: &[u8]) -> Result<String> {
        let dir = tempfile::tempdir()
            .map_err(|e| Error::Ocr(format!("failed to create temp dir: {e}")))?;
        let image_path = dir.path().join("input.png");
        tokio::fs::write(&image_path, data)
            .await
            .map_err(|e| Error::Ocr(format!("failed to write temp image: {e}")))?;

        let output = Command::new("tesseract")
            .arg(&image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .await
            .map_err(|e| {
                Error::Ocr(format!(
                    "failed to run tesseract (is it installed? apt install tesseract-ocr): {e}"
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!("tesseract exited with error: {stderr}")));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for Ocr {
    fn default() -> Self {
        Self::new("eng")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_or_bad_image_is_an_ocr_error() {
        // Whether or not tesseract is installed, garbage bytes must never
        // panic; they either OCR to nothing or fail with Error::Ocr.
        let ocr = Ocr::default();
        match ocr.image_to_text(b"not an image").await {
            Ok(text) => assert!(text.is_empty()),
            Err(Error::Ocr(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
}
