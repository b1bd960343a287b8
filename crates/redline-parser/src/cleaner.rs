//! Page cleaning and normalisation
//!
//! Removes header/footer noise, repairs hyphenated line breaks and
//! soft-wrapped lines, and joins pages into one text.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_FOOTER: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^page\s+\d+(\s+of\s+\d+)?$",
        r"(?i)^page\s*\d+\s*/\s*\d+$",
        r"(?i)^\d+\s+of\s+\d+$",
        r"^-\s*\d+\s*-$",
        r"(?i)^(copyright\b|©)",
        r"(?i)^all rights reserved\b",
        r"(?i)^confidential\.?$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z])-[ \t]*\r?\n[ \t]*([a-z])").expect("regex for hyphenated breaks")
});

static INLINE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+").expect("regex for inline whitespace"));

static EXCESS_BLANKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("regex for blank line runs"));

/// Characters that end a sentence or a list item
pub const SENTENCE_END_CHARS: [char; 5] = ['.', '?', '!', ';', ':'];

fn is_header_footer(line: &str) -> bool {
    HEADER_FOOTER.iter().any(|re| re.is_match(line))
}

/// Clean one page of extracted text
pub fn clean_page(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let text = HYPHEN_BREAK.replace_all(text, "$1$2");
    let text = INLINE_SPACE.replace_all(&text, " ");

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.is_empty() || !is_header_footer(line))
        .collect();

    EXCESS_BLANKS
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

/// Clean every page and join them into one document text
///
/// A blank line separates pages when the previous page ended a sentence,
/// a single newline otherwise.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut text = String::new();

    for page in pages {
        let cleaned = clean_page(page.as_ref());
        if cleaned.is_empty() {
            continue;
        }
        if !text.is_empty() {
            if text.ends_with(SENTENCE_END_CHARS) {
                text.push_str("\n\n");
            } else {
                text.push('\n');
            }
        }
        text.push_str(&cleaned);
    }

    text
}

/// Merge soft-wrapped lines, keeping blank lines as paragraph breaks
///
/// A line joins the buffered one when the buffer does not end a sentence
/// and the line starts lowercase.
pub fn merge_wrapped_lines(text: &str) -> Vec<String> {
    let mut merged = Vec::new();
    let mut buffer = String::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !buffer.is_empty() {
                merged.push(std::mem::take(&mut buffer));
            }
            merged.push(String::new());
            continue;
        }

        let continues = !buffer.is_empty()
            && !buffer.ends_with(SENTENCE_END_CHARS)
            && line.chars().next().is_some_and(char::is_lowercase);

        if continues {
            buffer.push(' ');
            buffer.push_str(line);
        } else {
            if !buffer.is_empty() {
                merged.push(std::mem::take(&mut buffer));
            }
            buffer.push_str(line);
        }
    }

    if !buffer.is_empty() {
        merged.push(buffer);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_headers_and_footers() {
        let page = "ACME MASTER SERVICES AGREEMENT\nPage 3 of 12\n1. Fees. Net 30.\n4 of 12\nCopyright 2024 Acme Inc.\nConfidential\n- 3 -";
        assert_eq!(
            clean_page(page),
            "ACME MASTER SERVICES AGREEMENT\n1. Fees. Net 30."
        );
    }

    #[test]
    fn test_keeps_confidential_sentences() {
        let page = "Confidential Information means all non-public data.";
        assert_eq!(clean_page(page), page);
    }

    #[test]
    fn test_joins_hyphenated_breaks() {
        assert_eq!(
            clean_page("The Receiving Party shall indem-\nnify the Discloser."),
            "The Receiving Party shall indemnify the Discloser."
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_page("a\t\tb   c\n\n\n\n\nd"), "a b c\n\nd");
    }

    #[test]
    fn test_join_pages_separators() {
        let pages = ["First page ends a sentence.", "Second page has no end", "third page"];
        assert_eq!(
            join_pages(&pages),
            "First page ends a sentence.\n\nSecond page has no end\nthird page"
        );
        assert_eq!(join_pages::<&str>(&[]), "");
        assert_eq!(join_pages(&["  ", "Only text."]), "Only text.");
    }

    #[test]
    fn test_merge_wrapped_lines() {
        let merged = merge_wrapped_lines(
            "The Vendor shall deliver\nthe goods on time.\nPayment is due.\n\n2. Term",
        );
        assert_eq!(
            merged,
            vec![
                "The Vendor shall deliver the goods on time.".to_string(),
                "Payment is due.".to_string(),
                String::new(),
                "2. Term".to_string(),
            ]
        );
    }

    #[test]
    fn test_merge_keeps_uppercase_starts() {
        let merged = merge_wrapped_lines("1. Definitions\nThe following terms apply");
        assert_eq!(merged.len(), 2);
    }
}
