//! Redline Parser - Contract ingestion and clause segmentation
//!
//! Supports ingestion of:
//! - PDF documents (native text, OCR fallback for scans)
//! - Microsoft Word (DOCX)
//! - Markdown and plain text files
//! - Scanned images (PNG, JPEG, TIFF)
//!
//! Each parser implements the `DocumentParser` trait and produces a
//! `ParsedDocument` holding raw text per page. The [`segment`] module turns
//! those pages into ordered clause segments.
//!
//! Author: hephaex@gmail.com

pub mod cleaner;
pub mod docx;
pub mod heading;
pub mod image;
pub mod pdf;
pub mod sanitize;
pub mod segment;
pub mod text;

pub use docx::DocxParser;
pub use image::ImageParser;
pub use pdf::PdfParser;
pub use segment::{SegmentError, Segmenter, SegmentationStrategy};
pub use text::PlainTextParser;

use std::path::Path;
use std::sync::Arc;

use redline_core::RedlineError;
use redline_ocr::OcrManager;
use thiserror::Error;

/// Why an upload could not be turned into page text
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("unsupported contract format '{0}' (accepted: pdf, docx, txt, md, png, jpg, tiff)")]
    UnsupportedFormat(String),

    #[error("cannot read {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Document is empty")]
    EmptyDocument,

    #[error("unreadable PDF: {0}")]
    PdfError(String),

    #[error("unreadable DOCX: {0}")]
    DocxError(String),

    #[error("scanned document could not be read: {0}")]
    OcrError(String),

    #[error("password-protected document: {0}")]
    EncryptedFile(String),

    #[error("damaged document: {0}")]
    CorruptedFile(String),

    #[error("text is not valid UTF-8: {0}")]
    EncodingError(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for RedlineError {
    fn from(err: ParserError) -> Self {
        RedlineError::parse_failed(err.to_string())
    }
}

// ============================================================================
// Ingested document
// ============================================================================

/// Raw page text of one upload
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub file_name: String,
    pub file_type: FileType,
    /// One entry per page; single-page formats carry one entry
    pub pages: Vec<String>,
    pub metadata: DocumentParseMetadata,
}

impl ParsedDocument {
    pub fn new(file_name: impl Into<String>, file_type: FileType) -> Self {
        Self {
            file_name: file_name.into(),
            file_type,
            pages: Vec::new(),
            metadata: DocumentParseMetadata::default(),
        }
    }

    pub fn with_pages(mut self, pages: Vec<String>) -> Self {
        self.metadata.page_count = pages.len() as u32;
        self.pages = pages;
        self
    }

    /// Mark the text as recognised from page images
    pub fn with_ocr(mut self, applied: bool) -> Self {
        self.metadata.ocr_applied = applied;
        self
    }

    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|page| !page.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentParseMetadata {
    pub page_count: u32,
    pub ocr_applied: bool,
}

/// Upload formats the registry routes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    Markdown,
    PlainText,
    Image,
    Unknown,
}

const EXTENSIONS: &[(&str, FileType)] = &[
    ("pdf", FileType::Pdf),
    ("docx", FileType::Docx),
    ("md", FileType::Markdown),
    ("markdown", FileType::Markdown),
    ("txt", FileType::PlainText),
    ("text", FileType::PlainText),
    ("png", FileType::Image),
    ("jpg", FileType::Image),
    ("jpeg", FileType::Image),
    ("tif", FileType::Image),
    ("tiff", FileType::Image),
    ("bmp", FileType::Image),
];

const MAGIC: &[(&[u8], FileType)] = &[
    (b"%PDF", FileType::Pdf),
    (b"PK\x03\x04", FileType::Docx),
    (b"\x89PNG", FileType::Image),
    (b"\xFF\xD8\xFF", FileType::Image),
    (b"II*\x00", FileType::Image),
    (b"MM\x00*", FileType::Image),
];

impl FileType {
    /// Case-insensitive extension lookup
    pub fn from_extension(ext: &str) -> Self {
        EXTENSIONS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map_or(Self::Unknown, |(_, file_type)| *file_type)
    }

    pub fn from_file_name(file_name: &str) -> Self {
        match Path::new(file_name).extension().and_then(|ext| ext.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Leading magic bytes; any valid UTF-8 counts as plain text
    pub fn sniff(bytes: &[u8]) -> Self {
        if let Some((_, file_type)) = MAGIC.iter().find(|(magic, _)| bytes.starts_with(magic)) {
            return *file_type;
        }
        if std::str::from_utf8(bytes).is_ok() {
            Self::PlainText
        } else {
            Self::Unknown
        }
    }

    /// Extension first, magic bytes when the name says nothing
    pub fn detect(file_name: &str, bytes: &[u8]) -> Self {
        match Self::from_file_name(file_name) {
            Self::Unknown => Self::sniff(bytes),
            known => known,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
            Self::Image => "image",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Parsers
// ============================================================================

/// One upload format to page text
pub trait DocumentParser: Send + Sync {
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument>;

    fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let (bytes, file_name) = read_upload(path)?;
        self.parse_bytes(&bytes, &file_name)
    }

    fn supported_types(&self) -> &[FileType];

    fn can_parse(&self, file_type: FileType) -> bool {
        self.supported_types().contains(&file_type)
    }
}

/// Routes an upload to the first parser that accepts its format
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Every built-in parser; the PDF and image parsers share `ocr`
    pub fn with_defaults(ocr: Option<Arc<OcrManager>>) -> Self {
        let mut registry = Self::new();
        registry.register(PlainTextParser);
        registry.register(PdfParser::new(ocr.clone()));
        registry.register(DocxParser::new());
        registry.register(ImageParser::new(ocr));
        registry
    }

    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Box::new(parser));
    }

    pub fn parser_for(&self, file_type: FileType) -> Option<&dyn DocumentParser> {
        self.parsers
            .iter()
            .map(|parser| parser.as_ref())
            .find(|parser| parser.can_parse(file_type))
    }

    pub fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument> {
        if bytes.is_empty() {
            return Err(ParserError::EmptyDocument);
        }

        let file_type = FileType::detect(file_name, bytes);
        let parser = match file_type {
            FileType::Unknown => None,
            known => self.parser_for(known),
        };
        let Some(parser) = parser else {
            let ext = Path::new(file_name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(file_type.as_str());
            return Err(ParserError::UnsupportedFormat(ext.to_string()));
        };

        let mut doc = parser.parse_bytes(bytes, file_name)?;
        doc.file_type = file_type;
        tracing::debug!(
            file = file_name,
            file_type = %file_type,
            pages = doc.pages.len(),
            ocr = doc.metadata.ocr_applied,
            "Parsed document"
        );
        Ok(doc)
    }

    pub fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let (bytes, file_name) = read_upload(path)?;
        self.parse_bytes(&bytes, &file_name)
    }
}

/// File contents plus the bare file name used for format detection
fn read_upload(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes = std::fs::read(path).map_err(|source| ParserError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((bytes, file_name))
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults(None)
    }
}

// ============================================================================
// Tests
// ============================================================================
