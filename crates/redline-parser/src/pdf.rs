//! PDF document parser using pdf-extract
//!
//! Extracts native text page by page. Scanned or low-text PDFs are
//! rasterised and OCRed when an engine is available.

use std::sync::Arc;

use redline_ocr::OcrManager;
use tracing::{debug, warn};

use crate::{DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// A page counts as text-bearing at this many non-whitespace characters
const MIN_TEXT_PAGE_CHARS: usize = 50;

/// PDF document parser
pub struct PdfParser {
    ocr: Option<Arc<OcrManager>>,
}

impl PdfParser {
    /// Create a PDF parser; `ocr` enables the scanned-document path
    pub fn new(ocr: Option<Arc<OcrManager>>) -> Self {
        Self { ocr }
    }

    /// Extract native text, one entry per page
    fn extract_native(&self, bytes: &[u8]) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed inputs
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| {
                ParserError::CorruptedFile("PDF structure could not be decoded".to_string())
            })?;

        let text = extracted.map_err(|e| {
            let message = e.to_string();
            if message.to_lowercase().contains("encrypt") {
                ParserError::EncryptedFile(message)
            } else {
                ParserError::PdfError(message)
            }
        })?;

        Ok(text.split('\x0C').map(str::to_string).collect())
    }

    fn ocr_pages(&self, bytes: &[u8]) -> Option<Vec<String>> {
        let ocr = self.ocr.as_ref().filter(|o| o.is_available())?;
        match ocr.extract_pdf_bytes(bytes) {
            Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => Some(pages),
            Ok(_) => {
                warn!("OCR produced no text");
                None
            }
            Err(e) => {
                warn!(error = %e, "OCR failed; keeping native text");
                None
            }
        }
    }
}

/// Decide whether native extraction produced real text rather than a scan
///
/// Native when (>= 800 chars and >= 40% text pages) or (>= 400 chars and
/// >= 60% text pages).
pub fn is_native_text(pages: &[String]) -> bool {
    if pages.is_empty() {
        return false;
    }

    let char_count: usize = pages.iter().map(|p| p.trim().chars().count()).sum();
    let text_pages = pages
        .iter()
        .filter(|p| p.chars().filter(|c| !c.is_whitespace()).count() >= MIN_TEXT_PAGE_CHARS)
        .count();
    let ratio = text_pages as f64 / pages.len() as f64;

    (char_count >= 800 && ratio >= 0.4) || (char_count >= 400 && ratio >= 0.6)
}

impl DocumentParser for PdfParser {
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument> {
        let native = self.extract_native(bytes);

        if let Ok(pages) = &native {
            if is_native_text(pages) {
                return Ok(ParsedDocument::new(file_name, FileType::Pdf).with_pages(pages.clone()));
            }
        }

        debug!(file = file_name, "PDF looks scanned or low-text; trying OCR");
        if let Some(pages) = self.ocr_pages(bytes) {
            return Ok(ParsedDocument::new(file_name, FileType::Pdf)
                .with_pages(pages)
                .with_ocr(true));
        }

        let pages = native?;
        Ok(ParsedDocument::new(file_name, FileType::Pdf).with_pages(pages))
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Pdf]
    }
}
