//! Clause heading detection
//!
//! Recognises numbered headings (`2.1 Use of Information`,
//! `ARTICLE V - Termination`), all-caps and colon-label headings, and
//! rejects address, contact and page-marker lines that look like them.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}(?:\.\d{1,3})*)[.)]?\s+(\S.*)$").expect("regex for numbered headings")
});

static ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:ARTICLE|Article|SECTION|Section)\s+([IVXLC]+|\d{1,2})\b[.:)]?\s*(?:[-–—]\s*)?(.*)$")
        .expect("regex for article headings")
});

static ALL_CAPS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9 &,'()/-]{3,79}$").expect("regex for all-caps headings")
});

static CAPS_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{3,}\b").expect("regex for capitalised words"));

static COLON_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][A-Za-z ]{1,40}):$").expect("regex for colon labels")
});

static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:\b(?:street|avenue|boulevard|blvd|suite|attention|attn|facsimile|fax|telephone|phone)\b|\bp\.?\s*o\.?\s+box\b)|\b(?:St|Ave|Ste|Tel)\.",
    )
    .expect("regex for address markers")
});

static ZIP_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").expect("regex for zip codes"));

static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.]\d{4}").expect("regex for phone numbers")
});

static PAGE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:page|p\.)\s*\d+").expect("regex for page markers")
});

/// Signature-block and form-field lines that are never headings
const BLACKLIST: [&str; 11] = [
    "DISCLOSING PARTY",
    "RECEIVING PARTY",
    "SIGNATURE",
    "SIGNATURES",
    "WITNESS",
    "NOTARY",
    "DATE",
    "IN WITNESS WHEREOF",
    "BY",
    "NAME",
    "TITLE",
];

/// Longest numbered-heading title, in words
const MAX_TITLE_WORDS: usize = 12;

/// A numbered heading split into id, title and the body that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedHeading {
    pub id: String,
    /// `None` when the text after the number is too long to be a title
    pub title: Option<String>,
    pub body: String,
}

/// Classification of one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Numbered(NumberedHeading),
    Titled(String),
    Body,
}

/// Convert a roman numeral to its value
pub fn roman_to_arabic(numeral: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut prev = 0u32;

    for c in numeral.chars().rev() {
        let value = match c.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            _ => return None,
        };
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total += value;
            prev = value;
        }
    }

    (total > 0).then_some(total)
}

/// Address, contact and page-marker lines are never headings
pub fn is_non_heading(text: &str) -> bool {
    ADDRESS.is_match(text)
        || ZIP_CODE.is_match(text)
        || PHONE.is_match(text)
        || PAGE_MARKER.is_match(text)
}

fn is_blacklisted(text: &str) -> bool {
    let normalized = text.trim().trim_end_matches([':', '.']).to_uppercase();
    BLACKLIST.contains(&normalized.as_str())
}

/// Split the text after a clause number into title and body
///
/// The title is the first sentence when it has at most 12 words.
fn split_title(rest: &str) -> (Option<String>, String) {
    let rest = rest.trim();

    let sentence_end = [". ", ": "]
        .iter()
        .filter_map(|sep| rest.find(sep))
        .min();

    let (candidate, body) = match sentence_end {
        Some(i) => (&rest[..i], rest[i + 2..].trim()),
        None if rest.ends_with(['.', ':']) => (&rest[..rest.len() - 1], ""),
        None => (rest, ""),
    };

    let words = candidate.split_whitespace().count();
    if words == 0 || words > MAX_TITLE_WORDS {
        return (None, rest.to_string());
    }

    let title = candidate.trim_end_matches(['.', ',', ':', ';']).trim();
    (Some(title.to_string()), body.to_string())
}

fn prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Line-level heading detector
#[derive(Debug, Clone)]
pub struct HeadingDetector {
    max_clause_number: u32,
}

impl HeadingDetector {
    pub fn new(max_clause_number: u32) -> Self {
        Self { max_clause_number }
    }

    /// Classify a line, numbered headings first
    pub fn classify(&self, line: &str) -> LineKind {
        if let Some(heading) = self.numbered(line) {
            LineKind::Numbered(heading)
        } else if let Some(title) = self.titled(line) {
            LineKind::Titled(title)
        } else {
            LineKind::Body
        }
    }

    /// Detect a numbered or ARTICLE/SECTION heading
    pub fn numbered(&self, line: &str) -> Option<NumberedHeading> {
        let line = line.trim();
        let (id, rest) = if let Some(caps) = NUMBERED.captures(line) {
            let top: u32 = caps[1].split('.').next()?.parse().ok()?;
            if top < 1 || top > self.max_clause_number {
                return None;
            }
            (caps[1].to_string(), caps[2].to_string())
        } else if let Some(caps) = ARTICLE.captures(line) {
            let raw = &caps[1];
            let number = match raw.parse::<u32>() {
                Ok(n) => n,
                Err(_) => roman_to_arabic(raw)?,
            };
            if number < 1 || number > self.max_clause_number {
                return None;
            }
            (number.to_string(), caps[2].to_string())
        } else {
            return None;
        };

        if !rest.is_empty() && !rest.starts_with(|c: char| c.is_uppercase()) {
            return None;
        }
        if rest.to_uppercase().starts_with("PAGE") {
            return None;
        }

        let (title, body) = if rest.is_empty() {
            (None, String::new())
        } else {
            split_title(&rest)
        };

        let checked = title.as_deref().unwrap_or_else(|| prefix(line, 40));
        if is_non_heading(checked) || title.as_deref().is_some_and(is_blacklisted) {
            return None;
        }

        Some(NumberedHeading { id, title, body })
    }

    /// Detect an all-caps heading or a short colon label
    pub fn titled(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if is_blacklisted(line) || is_non_heading(line) {
            return None;
        }

        let bare = line.trim_end_matches([':', '.']);
        if ALL_CAPS.is_match(bare) && CAPS_WORD.is_match(bare) {
            return Some(bare.trim().to_string());
        }

        let caps = COLON_LABEL.captures(line)?;
        let label = caps[1].trim();
        (label.split_whitespace().count() <= 5).then(|| label.to_string())
    }
}

impl Default for HeadingDetector {
    fn default() -> Self {
        Self::new(99)
    }
}
