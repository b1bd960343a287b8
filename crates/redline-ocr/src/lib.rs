//! Redline OCR - text recovery for scanned contracts
//!
//! Scanned agreements arrive either as page images or as PDFs with no text
//! layer. Images go straight to `tesseract`; PDFs are first rendered to PNG
//! with poppler's `pdftoppm`. Both are external programs driven through
//! [`ExternalTool`], and the recogniser sits behind [`OcrEngine`] so tests and
//! alternative engines can replace it.
//!
//! Author: hephaex@gmail.com

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("{tool} exited unsuccessfully: {stderr}")]
    ToolFailed { tool: String, stderr: String },

    #[error("could not start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scratch file error: {0}")]
    Scratch(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OcrError>;

/// Recognised text of one page image
#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    /// 1-based position in the batch
    pub page: u32,
}

impl OcrResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: 1,
        }
    }
}

/// Text recogniser for a single page image
pub trait OcrEngine: Send + Sync {
    fn extract_text(&self, image_path: &Path) -> Result<OcrResult>;

    /// Recognise pages in order, numbering them from 1
    fn extract_pages(&self, image_paths: &[PathBuf]) -> Result<Vec<OcrResult>> {
        let mut pages = Vec::with_capacity(image_paths.len());
        for (page, path) in (1u32..).zip(image_paths) {
            let mut result = self.extract_text(path)?;
            result.page = page;
            pages.push(result);
        }
        Ok(pages)
    }

    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}

// ============================================================================
// External programs
// ============================================================================

/// A command-line program located on `PATH` or at an explicit location
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: String,
    probe_flag: &'static str,
}

impl ExternalTool {
    pub fn new(program: impl Into<String>, probe_flag: &'static str) -> Self {
        Self {
            program: program.into(),
            probe_flag,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the program starts and answers its version flag
    pub fn probe(&self) -> bool {
        Command::new(&self.program)
            .arg(self.probe_flag)
            .output()
            .is_ok_and(|out| out.status.success())
    }

    /// Run to completion and return stdout
    pub fn run<I, S>(&self, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let out = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| OcrError::Spawn {
                tool: self.program.clone(),
                source,
            })?;

        if out.status.success() {
            Ok(out.stdout)
        } else {
            Err(OcrError::ToolFailed {
                tool: self.program.clone(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            })
        }
    }
}

// ============================================================================
// Tesseract
// ============================================================================

/// `tesseract <image> stdout -l <lang> --psm <mode>`
#[derive(Debug, Clone)]
pub struct Tesseract {
    tool: ExternalTool,
    /// Language pack(s), e.g. "eng" or "eng+deu"
    pub language: String,
    /// Page segmentation mode; 6 reads the page as one block of text
    pub psm: u8,
}

impl Default for Tesseract {
    fn default() -> Self {
        Self {
            tool: ExternalTool::new("tesseract", "--version"),
            language: "eng".to_string(),
            psm: 6,
        }
    }
}

impl Tesseract {
    pub fn at(program: impl Into<String>) -> Self {
        Self {
            tool: ExternalTool::new(program, "--version"),
            ..Self::default()
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    fn arguments(&self, image_path: &Path) -> Vec<String> {
        vec![
            image_path.display().to_string(),
            "stdout".into(),
            "-l".into(),
            self.language.clone(),
            "--psm".into(),
            self.psm.to_string(),
        ]
    }
}

impl OcrEngine for Tesseract {
    fn extract_text(&self, image_path: &Path) -> Result<OcrResult> {
        let stdout = self.tool.run(self.arguments(image_path))?;
        Ok(OcrResult::new(String::from_utf8_lossy(&stdout).trim()))
    }

    fn is_available(&self) -> bool {
        self.tool.probe()
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

// ============================================================================
// pdftoppm
// ============================================================================

/// Renders every page of a PDF to PNG
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    tool: ExternalTool,
    pub dpi: u32,
}

impl Default for PdfRasterizer {
    fn default() -> Self {
        Self {
            tool: ExternalTool::new("pdftoppm", "-v"),
            dpi: 300,
        }
    }
}

impl PdfRasterizer {
    pub fn is_available(&self) -> bool {
        self.tool.probe()
    }

    /// Page images written into `out_dir`, in page order
    pub fn rasterize(&self, pdf_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let dpi = self.dpi.to_string();
        let prefix = out_dir.join("page");
        self.tool.run([
            OsStr::new("-r"),
            OsStr::new(&dpi),
            OsStr::new("-png"),
            pdf_path.as_os_str(),
            prefix.as_os_str(),
        ])?;

        let mut pages = Vec::new();
        for entry in std::fs::read_dir(out_dir)? {
            let path = entry?.path();
            if path.extension() == Some(OsStr::new("png")) {
                pages.push(path);
            }
        }
        // page numbers are zero-padded
        pages.sort();

        debug!(pages = pages.len(), dpi = self.dpi, "Rendered scanned PDF");
        Ok(pages)
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Entry point used by the document parsers
///
/// The first registered engine does the recognition; later ones are kept as
/// alternatives and show up in [`OcrManager::available_engines`].
pub struct OcrManager {
    engines: Vec<Box<dyn OcrEngine>>,
    rasterizer: PdfRasterizer,
}

impl OcrManager {
    /// Probe the system for tesseract
    pub fn new() -> Self {
        let mut manager = Self::empty();
        let tesseract = Tesseract::default();
        if tesseract.is_available() {
            manager.register(tesseract);
        } else {
            debug!("tesseract not on PATH; scanned documents will be rejected");
        }
        manager
    }

    pub fn empty() -> Self {
        Self {
            engines: Vec::new(),
            rasterizer: PdfRasterizer::default(),
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: PdfRasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn register<E: OcrEngine + 'static>(&mut self, engine: E) {
        self.engines.push(Box::new(engine));
    }

    pub fn is_available(&self) -> bool {
        !self.engines.is_empty()
    }

    pub fn available_engines(&self) -> Vec<&str> {
        self.engines.iter().map(|engine| engine.name()).collect()
    }

    fn primary(&self) -> Result<&dyn OcrEngine> {
        match self.engines.first() {
            Some(engine) => Ok(engine.as_ref()),
            None => Err(OcrError::EngineNotAvailable(
                "no OCR engine registered".to_string(),
            )),
        }
    }

    /// Recognise an uploaded image; `extension` keeps the engine's format sniffing happy
    pub fn extract_image_bytes(&self, bytes: &[u8], extension: &str) -> Result<OcrResult> {
        let engine = self.primary()?;
        let scratch = tempfile::Builder::new()
            .prefix("redline-ocr-")
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        std::fs::write(scratch.path(), bytes)?;
        engine.extract_text(scratch.path())
    }

    /// Render a scanned PDF and recognise each page
    pub fn extract_pdf_bytes(&self, bytes: &[u8]) -> Result<Vec<String>> {
        let engine = self.primary()?;
        if !self.rasterizer.is_available() {
            return Err(OcrError::EngineNotAvailable(format!(
                "{} is not installed",
                self.rasterizer.tool.program()
            )));
        }

        let workdir = tempfile::Builder::new().prefix("redline-pdf-").tempdir()?;
        let pdf_path = workdir.path().join("input.pdf");
        std::fs::write(&pdf_path, bytes)?;
        let images_dir = workdir.path().join("pages");
        std::fs::create_dir(&images_dir)?;

        let images = self.rasterizer.rasterize(&pdf_path, &images_dir)?;
        if images.is_empty() {
            warn!("PDF rendered to zero page images");
        }

        let pages = engine.extract_pages(&images)?;
        Ok(pages.into_iter().map(|page| page.text).collect())
    }
}

impl Default for OcrManager {
    fn default() -> Self {
        Self::new()
    }
}
