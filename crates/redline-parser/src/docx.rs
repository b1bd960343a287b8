//! DOCX document parser using docx-rs
//!
//! Extracts paragraph and table text from Word documents. Word has no
//! reliable page model, so the whole body is one logical page.

use docx_rs::read_docx;

use crate::{DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// DOCX document parser
pub struct DocxParser {
    /// Emit table rows as `cell | cell` lines
    pub include_tables: bool,
}

impl DocxParser {
    pub fn new() -> Self {
        Self {
            include_tables: true,
        }
    }

    pub fn with_tables(mut self, enabled: bool) -> Self {
        self.include_tables = enabled;
        self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &para.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => text.push(' '),
                    _ => {}
                }
            }
        }
    }
    text
}

impl DocumentParser for DocxParser {
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument> {
        let docx = read_docx(bytes).map_err(|e| ParserError::DocxError(e.to_string()))?;

        // Paragraphs become blank-line separated blocks so headings stay on their own line
        let mut blocks: Vec<String> = Vec::new();

        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(para) => {
                    let text = paragraph_text(para);
                    if !text.trim().is_empty() {
                        blocks.push(text.trim().to_string());
                    }
                }
                docx_rs::DocumentChild::Table(tbl) if self.include_tables => {
                    let mut rows = Vec::new();

                    for row in &tbl.rows {
                        let docx_rs::TableChild::TableRow(tr) = row;
                        let mut cells = Vec::new();

                        for cell in &tr.cells {
                            let docx_rs::TableRowChild::TableCell(tc) = cell;
                            let mut cell_text = String::new();

                            for content in &tc.children {
                                if let docx_rs::TableCellContent::Paragraph(para) = content {
                                    if !cell_text.is_empty() {
                                        cell_text.push(' ');
                                    }
                                    cell_text.push_str(paragraph_text(para).trim());
                                }
                            }

                            cells.push(cell_text.trim().to_string());
                        }

                        if cells.iter().any(|c| !c.is_empty()) {
                            rows.push(cells.join(" | "));
                        }
                    }

                    if !rows.is_empty() {
                        blocks.push(rows.join("\n"));
                    }
                }
                _ => {}
            }
        }

        Ok(ParsedDocument::new(file_name, FileType::Docx).with_pages(vec![blocks.join("\n\n")]))
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Docx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_docx() -> Vec<u8> {
        let docx = docx_rs::Docx::new()
            .add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("1. Confidentiality")),
            )
            .add_paragraph(docx_rs::Paragraph::new().add_run(
                docx_rs::Run::new().add_text("The Receiving Party shall hold all information in confidence."),
            ))
            .add_table(docx_rs::Table::new(vec![docx_rs::TableRow::new(vec![
                docx_rs::TableCell::new()
                    .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Fee"))),
                docx_rs::TableCell::new()
                    .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("$5,000"))),
            ])]));

        let mut buf = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_parse_generated_docx() {
        let doc = DocxParser::new()
            .parse_bytes(&build_docx(), "nda.docx")
            .unwrap();
        assert_eq!(doc.pages.len(), 1);
        let text = &doc.pages[0];
        assert!(text.starts_with("1. Confidentiality\n\nThe Receiving Party"));
        assert!(text.contains("Fee | $5,000"));
    }

    #[test]
    fn test_tables_can_be_skipped() {
        let doc = DocxParser::new()
            .with_tables(false)
            .parse_bytes(&build_docx(), "nda.docx")
            .unwrap();
        assert!(!doc.pages[0].contains("$5,000"));
    }

    #[test]
    fn test_invalid_docx() {
        let result = DocxParser::new().parse_bytes(b"PK\x03\x04 not a zip", "bad.docx");
        assert!(matches!(result, Err(ParserError::DocxError(_))));
    }
}
