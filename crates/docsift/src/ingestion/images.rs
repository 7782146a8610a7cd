//! Embedded-image extraction from PDFs.

use lopdf::{Document, Object};

/// Collect embedded raster images from a PDF.
///
/// Walks every stream object and keeps image XObjects whose filter is
/// DCTDecode, since those streams are complete JPEG files usable directly
/// by OCR. Non-JPEG encodings (raw samples behind FlateDecode, JBIG2, ...)
/// are skipped. Per-image problems never fail the document.
pub fn extract_pdf_images(data: &[u8]) -> Vec<Vec<u8>> {
    let doc = match Document::load_mem(data) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("could not load PDF for image extraction: {e}");
            return Vec::new();
        }
    };

    let mut images = Vec::new();

    for (id, object) in &doc.objects {
        let Object::Stream(stream) = object else {
            continue;
        };

        let is_image = matches!(
            stream.dict.get(b"Subtype"),
            Ok(Object::Name(name)) if name.as_slice() == b"Image"
        );
        if !is_image {
            continue;
        }

        if has_dct_filter(&stream.dict) {
            images.push(stream.content.clone());
        } else {
            tracing::debug!("skipping non-JPEG image stream {:?}", id);
        }
    }

    images
}

/// True when the stream's filter chain produces a JPEG payload.
fn has_dct_filter(dict: &lopdf::Dictionary) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => name.as_slice() == b"DCTDecode",
        Ok(Object::Array(filters)) => filters
            .iter()
            .any(|f| matches!(f, Object::Name(name) if name.as_slice() == b"DCTDecode")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_yields_no_images() {
        assert!(extract_pdf_images(b"definitely not a pdf").is_empty());
    }

    #[test]
    fn dct_filter_detection() {
        let mut dict = lopdf::Dictionary::new();
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        assert!(has_dct_filter(&dict));

        let mut dict = lopdf::Dictionary::new();
        dict.set(
            "Filter",
            Object::Array(vec![
                Object::Name(b"FlateDecode".to_vec()),
                Object::Name(b"DCTDecode".to_vec()),
            ]),
        );
        assert!(has_dct_filter(&dict));

        let mut dict = lopdf::Dictionary::new();
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        assert!(!has_dct_filter(&dict));
    }
}
