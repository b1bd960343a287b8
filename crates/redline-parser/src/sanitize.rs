//! Span sanitisation for binary noise and stray control characters

/// Sanitised clause text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    /// The span was mostly binary noise and was replaced by the empty quote
    pub unreadable: bool,
}

/// Control characters other than line breaks and tabs, plus decode failures
pub fn is_non_printable(c: char) -> bool {
    (c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        || c == char::REPLACEMENT_CHARACTER
        || ('\u{E000}'..='\u{F8FF}').contains(&c)
}

/// Share of non-printable characters in `text`, ignoring whitespace
pub fn non_printable_ratio(text: &str) -> f64 {
    let (total, bad) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(total, bad), c| {
            (total + 1, bad + usize::from(is_non_printable(c)))
        });

    if total == 0 {
        0.0
    } else {
        bad as f64 / total as f64
    }
}

/// Replace noise spans with the empty quote, strip stray control characters otherwise
pub fn sanitize_span(text: &str, max_non_printable_ratio: f64) -> Sanitized {
    if non_printable_ratio(text) > max_non_printable_ratio {
        return Sanitized {
            text: String::new(),
            unreadable: true,
        };
    }

    Sanitized {
        text: text
            .chars()
            .filter(|c| !is_non_printable(*c))
            .collect::<String>()
            .trim()
            .to_string(),
        unreadable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_passes_through() {
        let result = sanitize_span("The Vendor shall deliver.\n\tOn time.", 0.8);
        assert_eq!(result.text, "The Vendor shall deliver.\n\tOn time.");
        assert!(!result.unreadable);
    }

    #[test]
    fn test_strips_stray_controls() {
        let result = sanitize_span("Fees\u{0007} are\u{FFFD} due.", 0.8);
        assert_eq!(result.text, "Fees are due.");
        assert!(!result.unreadable);
    }

    #[test]
    fn test_binary_noise_becomes_empty_quote() {
        let noise: String = (0..100).map(|i| char::from(1 + (i % 7) as u8)).collect();
        let result = sanitize_span(&format!("{noise}ok"), 0.8);
        assert_eq!(result.text, "");
        assert!(result.unreadable);
    }

    #[test]
    fn test_ratio_ignores_whitespace() {
        assert_eq!(non_printable_ratio("   \n"), 0.0);
        assert_eq!(non_printable_ratio("ab\u{0001}\u{0002}"), 0.5);
    }
}
