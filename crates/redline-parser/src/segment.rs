//! Clause segmentation
//!
//! Turns ingested page text into an ordered sequence of [`ClauseSegment`]s.
//! The strategy is chosen per document: numbered headings when they are
//! frequent enough, then all-caps/colon headings, then paragraph breaks.
//!
//! IDs come from heading numbers (`"2.1"`) or sequential integers. Text
//! before the first heading becomes clause `"0"` (`Preamble`).

use std::collections::{HashMap, HashSet};

use redline_core::{ClauseSegment, RedlineError, SegmentationConfig};
use thiserror::Error;
use tracing::debug;

use crate::cleaner::{join_pages, merge_wrapped_lines};
use crate::heading::{HeadingDetector, LineKind};
use crate::sanitize::sanitize_span;

/// Segmentation failures; both surface to callers as a parse failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("document contains no pages")]
    EmptyDocument,

    #[error("document has too little readable text ({found} alphanumeric characters, at least {required} required)")]
    InsufficientText { found: usize, required: usize },
}

impl From<SegmentError> for RedlineError {
    fn from(err: SegmentError) -> Self {
        RedlineError::parse_failed(err.to_string())
    }
}

/// How clause boundaries were found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationStrategy {
    Numbered,
    Titled,
    Paragraph,
}

impl std::fmt::Display for SegmentationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numbered => write!(f, "numbered"),
            Self::Titled => write!(f, "titled"),
            Self::Paragraph => write!(f, "paragraph"),
        }
    }
}

/// A clause under construction
#[derive(Debug, Default)]
struct Block {
    id: Option<String>,
    title: Option<String>,
    lines: Vec<String>,
}

impl Block {
    fn body(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Clause segmenter
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmentationConfig,
    detector: HeadingDetector,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        let detector = HeadingDetector::new(config.max_clause_number);
        Self { config, detector }
    }

    /// Clean, join and segment the pages of one document
    pub fn segment_pages<S: AsRef<str>>(
        &self,
        pages: &[S],
    ) -> Result<Vec<ClauseSegment>, SegmentError> {
        if pages.is_empty() {
            return Err(SegmentError::EmptyDocument);
        }
        self.segment_text(&join_pages(pages))
    }

    /// Segment already-cleaned document text
    pub fn segment_text(&self, text: &str) -> Result<Vec<ClauseSegment>, SegmentError> {
        let found = text.chars().filter(|c| c.is_alphanumeric()).count();
        if found < self.config.min_alnum_chars {
            return Err(SegmentError::InsufficientText {
                found,
                required: self.config.min_alnum_chars,
            });
        }

        let lines = merge_wrapped_lines(text);
        let kinds: Vec<LineKind> = lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    LineKind::Body
                } else {
                    self.detector.classify(line)
                }
            })
            .collect();

        let strategy = self.select_strategy(&lines, &kinds);
        let (preamble, blocks) = match strategy {
            SegmentationStrategy::Numbered => Self::heading_blocks(lines, kinds, true),
            SegmentationStrategy::Titled => Self::heading_blocks(lines, kinds, false),
            SegmentationStrategy::Paragraph => (Vec::new(), self.paragraph_blocks(&lines)),
        };

        let segments = self.assemble(preamble, blocks);
        if segments.is_empty() {
            return Err(SegmentError::InsufficientText {
                found,
                required: self.config.min_alnum_chars,
            });
        }

        debug!(
            strategy = %strategy,
            clauses = segments.len(),
            unreadable = segments.iter().filter(|s| s.unreadable).count(),
            "Segmented document"
        );
        Ok(segments)
    }

    /// Pick the highest-priority strategy whose heading hits qualify
    pub fn select_strategy(&self, lines: &[String], kinds: &[LineKind]) -> SegmentationStrategy {
        let non_empty = lines.iter().filter(|l| !l.is_empty()).count();
        let numbered = kinds
            .iter()
            .filter(|k| matches!(k, LineKind::Numbered(_)))
            .count();
        let titled = kinds
            .iter()
            .filter(|k| matches!(k, LineKind::Titled(_)))
            .count();

        if self.qualifies(numbered, non_empty) {
            SegmentationStrategy::Numbered
        } else if self.qualifies(titled, non_empty) {
            SegmentationStrategy::Titled
        } else {
            SegmentationStrategy::Paragraph
        }
    }

    fn qualifies(&self, hits: usize, non_empty: usize) -> bool {
        non_empty > 0
            && hits >= self.config.min_heading_hits
            && hits as f64 / non_empty as f64 >= self.config.min_heading_hit_rate
    }

    /// Split on heading lines; lines before the first heading form the preamble
    fn heading_blocks(
        lines: Vec<String>,
        kinds: Vec<LineKind>,
        numbered: bool,
    ) -> (Vec<String>, Vec<Block>) {
        let mut preamble = Vec::new();
        let mut blocks: Vec<Block> = Vec::new();

        for (line, kind) in lines.into_iter().zip(kinds) {
            match kind {
                LineKind::Numbered(heading) if numbered => {
                    let mut block = Block {
                        id: Some(heading.id),
                        title: heading.title,
                        lines: Vec::new(),
                    };
                    if !heading.body.is_empty() {
                        block.lines.push(heading.body);
                    }
                    blocks.push(block);
                }
                LineKind::Titled(title) if !numbered => blocks.push(Block {
                    title: Some(title),
                    ..Block::default()
                }),
                _ => match blocks.last_mut() {
                    Some(block) => block.lines.push(line),
                    None => preamble.push(line),
                },
            }
        }

        (preamble, blocks)
    }

    /// Blank-line paragraphs; tiny fragments attach to a neighbour
    fn paragraph_blocks(&self, lines: &[String]) -> Vec<Block> {
        let min_words = self.config.min_fragment_words;
        let mut paragraphs: Vec<Vec<String>> = Vec::new();
        let mut leading: Vec<String> = Vec::new();

        for chunk in lines.split(|l| l.is_empty()) {
            if chunk.is_empty() {
                continue;
            }
            let tiny = chunk.iter().map(|l| word_count(l)).sum::<usize>() < min_words;

            match paragraphs.last_mut() {
                Some(previous) if tiny => previous.extend(chunk.iter().cloned()),
                None if tiny => leading.extend(chunk.iter().cloned()),
                _ => {
                    let mut paragraph = std::mem::take(&mut leading);
                    paragraph.extend(chunk.iter().cloned());
                    paragraphs.push(paragraph);
                }
            }
        }

        // Every paragraph was tiny
        if !leading.is_empty() {
            paragraphs.push(leading);
        }

        paragraphs
            .into_iter()
            .map(|lines| Block {
                lines,
                ..Block::default()
            })
            .collect()
    }

    /// Assign IDs, merge duplicates, sanitise and number the clauses
    fn assemble(&self, preamble: Vec<String>, blocks: Vec<Block>) -> Vec<ClauseSegment> {
        let mut raw: Vec<(String, String, String)> = Vec::new();
        let mut index_by_id: HashMap<String, usize> = HashMap::new();

        let preamble_text = preamble.join("\n").trim().to_string();
        if word_count(&preamble_text) >= self.config.min_fragment_words {
            index_by_id.insert("0".to_string(), raw.len());
            raw.push(("0".to_string(), "Preamble".to_string(), preamble_text));
        }

        let mut next_seq = 1u32;
        for block in blocks {
            let body = block.body();
            let id = block.id.unwrap_or_else(|| {
                let id = next_seq.to_string();
                next_seq += 1;
                id
            });

            match index_by_id.get(&id) {
                // Duplicate number: keep the first position, later title wins, bodies concatenate
                Some(&existing) => {
                    let (_, title, text) = &mut raw[existing];
                    if let Some(later_title) = block.title {
                        *title = later_title;
                    }
                    if !body.is_empty() {
                        if !text.is_empty() {
                            text.push_str("\n\n");
                        }
                        text.push_str(&body);
                    }
                }
                None => {
                    let title = block.title.unwrap_or_else(|| format!("Section {id}"));
                    index_by_id.insert(id.clone(), raw.len());
                    raw.push((id, title, body));
                }
            }
        }

        let ids: HashSet<String> = raw.iter().map(|(id, _, _)| id.clone()).collect();

        raw.into_iter()
            .enumerate()
            .map(|(position, (id, title, text))| {
                let sanitized = sanitize_span(&text, self.config.max_non_printable_ratio);
                let title = sanitize_span(&title, 1.0).text;
                let parent = id
                    .rsplit_once('.')
                    .map(|(parent, _)| parent.to_string())
                    .filter(|parent| ids.contains(parent));

                let mut segment = ClauseSegment::new(id, title, sanitized.text, position as u32 + 1);
                segment.unreadable = sanitized.unreadable;
                segment.parent_id = parent;
                segment
            })
            .collect()
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmentationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NDA: &str = "MUTUAL NON-DISCLOSURE AGREEMENT

This Agreement is entered into by Acme Corp. and Beta LLC on January 5, 2024.

1. Definitions. Confidential Information means all non-public information disclosed by either party.

2. Obligations
The Receiving Party shall hold Confidential Information in strict confidence.

2.1 Exceptions. Information that is publicly available is excluded.

3. Term. This Agreement remains in effect for two (2) years.

4. Governing Law. This Agreement shall be governed by the laws of Delaware.
";

    fn segmenter() -> Segmenter {
        Segmenter::default()
    }

    #[test]
    fn test_numbered_segmentation() {
        let clauses = segmenter().segment_text(NDA).unwrap();
        let ids: Vec<&str> = clauses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "2.1", "3", "4"]);

        assert_eq!(clauses[0].title, "Preamble");
        assert!(clauses[0].text.starts_with("MUTUAL NON-DISCLOSURE AGREEMENT"));

        assert_eq!(clauses[1].title, "Definitions");
        assert!(clauses[1].text.starts_with("Confidential Information means"));

        assert_eq!(clauses[2].title, "Obligations");
        assert!(clauses[2].text.contains("strict confidence"));

        assert_eq!(clauses[3].parent_id.as_deref(), Some("2"));
        assert_eq!(clauses[5].title, "Governing Law");

        let ordinals: Vec<u32> = clauses.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_segment_pages_joins_pages() {
        let pages = [
            "1. Fees. Client shall pay all invoices within thirty days.\nPage 1 of 2",
            "2. Termination. Either party may terminate this Agreement on notice.\nPage 2 of 2",
        ];
        let clauses = segmenter().segment_pages(&pages).unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1].title, "Termination");
        assert!(!clauses[1].text.contains("Page"));
    }

    #[test]
    fn test_titled_segmentation() {
        let text = "CONFIDENTIALITY\nThe Receiving Party shall keep all information secret.\n\nTERMINATION\nEither party may terminate this Agreement with notice.\n\nGOVERNING LAW\nThe laws of New York govern this Agreement.";
        let clauses = segmenter().segment_text(text).unwrap();
        let ids: Vec<&str> = clauses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(clauses[0].title, "CONFIDENTIALITY");
        assert_eq!(clauses[2].title, "GOVERNING LAW");
    }

    #[test]
    fn test_paragraph_fallback() {
        let text = "The Vendor shall deliver the goods within ten days of each order.\n\nThe Client shall pay for delivered goods within thirty days.\n\nSigned.";
        let clauses = segmenter().segment_text(text).unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].id, "1");
        assert_eq!(clauses[0].title, "Section 1");
        // tiny trailing fragment attaches to the previous clause
        assert!(clauses[1].text.ends_with("Signed."));
    }

    #[test]
    fn test_tiny_first_paragraph_attaches_forward() {
        let text = "Recitals.\n\nThe Vendor shall deliver the goods within ten days of each order placed.";
        let clauses = segmenter().segment_text(text).unwrap();
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].text.starts_with("Recitals."));
    }

    #[test]
    fn test_duplicate_numbers_merge() {
        let text = "1. Fees. Client shall pay the fees set out in the order form.\n2. Term. This Agreement lasts one year from signature.\n1. Payment Terms. Invoices are due within thirty days.";
        let clauses = segmenter().segment_text(text).unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].id, "1");
        assert_eq!(clauses[0].ordinal, 1);
        assert_eq!(clauses[0].title, "Payment Terms");
        assert!(clauses[0].text.starts_with("Client shall pay"));
        assert!(clauses[0].text.ends_with("Invoices are due within thirty days."));
    }

    #[test]
    fn test_short_preamble_discarded() {
        let text = "NDA\n1. Scope. This Agreement covers all shared engineering data.\n2. Term. It lasts for two years after the effective date.";
        let clauses = segmenter().segment_text(text).unwrap();
        assert_eq!(clauses[0].id, "1");
    }

    #[test]
    fn test_unreadable_span() {
        let noise: String = (0..120).map(|i| char::from(1 + (i % 7) as u8)).collect();
        let text = format!(
            "1. Scope. This Agreement covers all shared engineering data.\n2. Annex\n{noise}\n3. Term. It lasts for two years after signature."
        );
        let clauses = segmenter().segment_text(&text).unwrap();
        let annex = clauses.iter().find(|c| c.id == "2").unwrap();
        assert!(annex.unreadable);
        assert_eq!(annex.text, "");
        assert!(clauses.iter().filter(|c| c.id != "2").all(|c| !c.unreadable));
    }

    #[test]
    fn test_empty_and_short_documents_fail() {
        assert_eq!(
            segmenter().segment_pages::<&str>(&[]),
            Err(SegmentError::EmptyDocument)
        );
        assert!(matches!(
            segmenter().segment_pages(&["   \n\t  "]),
            Err(SegmentError::InsufficientText { found: 0, .. })
        ));
        assert!(segmenter().segment_text("Too short.").is_err());
    }

    #[test]
    fn test_segment_error_is_parse_failure() {
        let err: RedlineError = SegmentError::EmptyDocument.into();
        assert!(err.is_parse_failure());
    }

    proptest! {
        #[test]
        fn prop_segmentation_is_deterministic(
            paragraphs in prop::collection::vec("[A-Za-z0-9 .,:]{0,80}", 1..12),
            numbered in any::<bool>(),
        ) {
            let text = paragraphs
                .iter()
                .enumerate()
                .map(|(i, p)| if numbered { format!("{}. Heading {}\n{}", i + 1, i, p) } else { p.clone() })
                .collect::<Vec<_>>()
                .join("\n\n");

            let first = segmenter().segment_text(&text);
            let second = segmenter().segment_text(&text);
            prop_assert_eq!(&first, &second);

            if let Ok(clauses) = first {
                prop_assert!(!clauses.is_empty());
                let ids: HashSet<&str> = clauses.iter().map(|c| c.id.as_str()).collect();
                prop_assert_eq!(ids.len(), clauses.len());
                for (i, clause) in clauses.iter().enumerate() {
                    prop_assert_eq!(clause.ordinal as usize, i + 1);
                }
            }
        }
    }
}
