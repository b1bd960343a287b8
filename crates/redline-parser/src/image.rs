//! Scanned image parser backed by the OCR adapter

use std::path::Path;
use std::sync::Arc;

use redline_ocr::OcrManager;

use crate::{DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// Image parser; every image is one page of OCR text
pub struct ImageParser {
    ocr: Option<Arc<OcrManager>>,
}

impl ImageParser {
    pub fn new(ocr: Option<Arc<OcrManager>>) -> Self {
        Self { ocr }
    }
}

impl DocumentParser for ImageParser {
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument> {
        let ocr = self.ocr.as_ref().filter(|o| o.is_available()).ok_or_else(|| {
            ParserError::OcrError(
                "no OCR engine available for scanned images (install tesseract)".to_string(),
            )
        })?;

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");

        let result = ocr
            .extract_image_bytes(bytes, extension)
            .map_err(|e| ParserError::OcrError(e.to_string()))?;

        Ok(ParsedDocument::new(file_name, FileType::Image)
            .with_pages(vec![result.text])
            .with_ocr(true))
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Image]
    }
}
