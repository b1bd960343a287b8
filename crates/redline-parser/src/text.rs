//! Plain text and Markdown parser

use crate::{DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// Characters inspected by the binary-content check
const SNIFF_CHARS: usize = 1000;

/// Minimum printable share of the sniffed prefix
const MIN_PRINTABLE_RATIO: f64 = 0.8;

/// Plain text parser; pages are separated by form feeds
pub struct PlainTextParser;

fn is_printable(c: char) -> bool {
    !(c.is_control() && !c.is_whitespace()) && c != char::REPLACEMENT_CHARACTER
}

impl DocumentParser for PlainTextParser {
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument> {
        if bytes.starts_with(b"%PDF") {
            return Err(ParserError::CorruptedFile(format!(
                "{file_name} contains PDF data but was uploaded as text"
            )));
        }

        let content = String::from_utf8_lossy(bytes);

        let sample: Vec<char> = content.chars().take(SNIFF_CHARS).collect();
        if !sample.is_empty() {
            let printable = sample.iter().filter(|c| is_printable(**c)).count();
            if (printable as f64) / (sample.len() as f64) < MIN_PRINTABLE_RATIO {
                return Err(ParserError::EncodingError(format!(
                    "{file_name} does not look like text"
                )));
            }
        }

        let file_type = match FileType::from_file_name(file_name) {
            FileType::Markdown => FileType::Markdown,
            _ => FileType::PlainText,
        };
        let pages = content.split('\x0C').map(str::to_string).collect();

        Ok(ParsedDocument::new(file_name, file_type).with_pages(pages))
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::PlainText, FileType::Markdown]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_pages_on_form_feed() {
        let doc = PlainTextParser
            .parse_bytes(b"Page one text.\x0cPage two text.", "contract.txt")
            .unwrap();
        assert_eq!(doc.pages, vec!["Page one text.", "Page two text."]);
        assert_eq!(doc.file_type, FileType::PlainText);
    }

    #[test]
    fn test_rejects_pdf_bytes() {
        let result = PlainTextParser.parse_bytes(b"%PDF-1.5 binary", "contract.txt");
        assert!(matches!(result, Err(ParserError::CorruptedFile(_))));
    }

    #[test]
    fn test_rejects_binary_content() {
        let bytes: Vec<u8> = (0u8..8).cycle().take(400).collect();
        let result = PlainTextParser.parse_bytes(&bytes, "contract.txt");
        assert!(matches!(result, Err(ParserError::EncodingError(_))));
    }

    #[test]
    fn test_lossy_utf8() {
        let mut bytes = b"Fees are due within thirty days of invoice.".to_vec();
        bytes.push(0xFF);
        let doc = PlainTextParser.parse_bytes(&bytes, "notes.md").unwrap();
        assert_eq!(doc.file_type, FileType::Markdown);
        assert!(doc.pages[0].starts_with("Fees are due"));
    }

    #[test]
    fn test_supported_types() {
        assert!(PlainTextParser.can_parse(FileType::PlainText));
        assert!(PlainTextParser.can_parse(FileType::Markdown));
        assert!(!PlainTextParser.can_parse(FileType::Pdf));
    }
}
