//! Keyword-based clause classification
//!
//! Every clause type owns a list of case-insensitive patterns. A pattern
//! found in the title scores 2, one found in the body scores 1. The best
//! scoring type becomes the primary type; ties go to the type with more
//! pattern occurrences, then to the type declared first in [`ClauseType`].

use regex::Regex;
use tracing::trace;

use redline_core::{ClauseSegment, ClauseType, Classification};

/// Score for a pattern found in the clause title
const TITLE_WEIGHT: u32 = 2;

/// Score for a pattern found in the clause body
const TEXT_WEIGHT: u32 = 1;

/// Maximum number of secondary types reported
const MAX_SECONDARY: usize = 2;

// ============================================================================
// Pattern table
// ============================================================================

fn patterns_for(clause_type: ClauseType) -> &'static [&'static str] {
    match clause_type {
        ClauseType::Indemnification => &[
            r"\bindemnif(y|ication|ied|ies)\b",
            r"\bhold\s+harmless\b",
            r"\bdefend.*against\b",
            r"\bliable.*for.*damages\b",
            r"\breimburse.*losses\b",
        ],
        ClauseType::Termination => &[
            r"\btermination\b",
            r"\bterminat(e|ed|es|ing)\b",
            r"\bend.*agreement\b",
            r"\bcancel(lation)?\b",
            r"\bwithdraw.*from\b",
            r"\bnotice.*to.*terminate\b",
        ],
        ClauseType::Liability => &[
            r"\bliability\b",
            r"\bliable\b",
            r"\bdamages\b",
            r"\bloss(es)?\b",
            r"\bclaims?\b",
            r"\blimitation.*of.*liability\b",
        ],
        ClauseType::Payment => &[
            r"\bpayment\b",
            r"\bfees?\b",
            r"\bcompensation\b",
            r"\bremuneration\b",
            r"\$[\d,]+",
            r"\binvoice\b",
            r"\bdue.*upon\b",
        ],
        ClauseType::Confidentiality => &[
            r"\bconfidential(ity)?\b",
            r"\bnon-disclosure\b",
            r"\bproprietary.*information\b",
            r"\btrade.*secret\b",
            r"\bnot.*disclose\b",
        ],
        ClauseType::IntellectualProperty => &[
            r"\bintellectual\s+property\b",
            r"\bcopyright\b",
            r"\bpatent\b",
            r"\btrademark\b",
            r"\bownership.*of.*work\b",
            r"\blicense\b",
        ],
        ClauseType::GoverningLaw => &[
            r"\bgoverning\s+law\b",
            r"\bjurisdiction\b",
            r"\bapplicable.*law\b",
            r"\bcourts?\s+of\b",
            r"\blaws?\s+of.*state\b",
        ],
        ClauseType::DisputeResolution => &[
            r"\bdispute.*resolution\b",
            r"\barbitration\b",
            r"\bmediation\b",
            r"\blitigation\b",
            r"\bresolve.*disputes?\b",
        ],
        ClauseType::NonCompete => &[
            r"\bnon-compete\b",
            r"\bcompetitive.*activity\b",
            r"\brestrictive.*covenant\b",
            r"\bnot.*compete\b",
        ],
        ClauseType::Warranty => &[
            r"\bwarrant(y|ies|ed)\b",
            r"\brepresent(ation)?s?\b",
            r"\bguarantee\b",
            r"\bas\s+is\b",
            r"\bno.*warranty\b",
        ],
        ClauseType::ForceMajeure => &[
            r"\bforce\s+majeure\b",
            r"\bact.*of.*god\b",
            r"\bunavoidable.*circumstance\b",
            r"\bbeyond.*reasonable.*control\b",
        ],
        ClauseType::Assignment => &[
            r"\bassignment\b",
            r"\bassign.*rights\b",
            r"\btransfer.*agreement\b",
            r"\bnot.*assign.*without\b",
        ],
        ClauseType::Amendment => &[
            r"\bamendment\b",
            r"\bmodif(y|ication)\b",
            r"\bchange.*terms\b",
            r"\bvaried.*by.*writing\b",
        ],
        ClauseType::Severability => &[
            r"\bseverability\b",
            r"\bseverable\b",
            r"\binvalid.*provision\b",
            r"\bunenforceable.*term\b",
        ],
        ClauseType::EntireAgreement => &[
            r"\bentire\s+agreement\b",
            r"\bsupersede\b",
            r"\bprior.*agreement\b",
            r"\bintegration\s+clause\b",
        ],
        ClauseType::General => &[],
    }
}

/// Score of one clause type against one clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TypeScore {
    clause_type: ClauseType,
    score: u32,
    occurrences: usize,
}

// ============================================================================
// Classifier
// ============================================================================

/// Deterministic keyword classifier
pub struct ClauseClassifier {
    /// Compiled patterns per clause type, in declaration order
    patterns: Vec<(ClauseType, Vec<Regex>)>,
}

impl ClauseClassifier {
    pub fn new() -> Self {
        let patterns = ClauseType::ALL
            .iter()
            .filter(|t| **t != ClauseType::General)
            .map(|t| {
                let compiled = patterns_for(*t)
                    .iter()
                    .filter_map(|p| Regex::new(&format!("(?i){p}")).ok())
                    .collect();
                (*t, compiled)
            })
            .collect();

        Self { patterns }
    }

    /// Classify a segment, honouring the unreadable marker
    pub fn classify_segment(&self, segment: &ClauseSegment) -> Classification {
        if segment.unreadable {
            return Classification::general();
        }
        self.classify(&segment.title, &segment.text)
    }

    /// Classify a clause from its title and body
    pub fn classify(&self, title: &str, text: &str) -> Classification {
        let ranked = self.rank(title, text);

        let Some(best) = ranked.first() else {
            return Classification::general();
        };

        let secondary = ranked
            .iter()
            .skip(1)
            .take(MAX_SECONDARY)
            .map(|s| s.clause_type)
            .collect();

        trace!(primary = %best.clause_type, score = best.score, "Clause classified");
        Classification::new(best.clause_type).with_secondary(secondary)
    }

    /// Primary type of an untitled text
    pub fn classify_text(&self, text: &str) -> ClauseType {
        self.classify("", text).primary
    }

    /// Every type with a non-zero score, best first
    fn rank(&self, title: &str, text: &str) -> Vec<TypeScore> {
        let mut scores: Vec<TypeScore> = self
            .patterns
            .iter()
            .map(|(clause_type, patterns)| {
                let mut score = 0;
                let mut occurrences = 0;
                for pattern in patterns {
                    let in_title = pattern.find_iter(title).count();
                    let in_text = pattern.find_iter(text).count();
                    if in_title > 0 {
                        score += TITLE_WEIGHT;
                    }
                    if in_text > 0 {
                        score += TEXT_WEIGHT;
                    }
                    occurrences += in_title + in_text;
                }
                TypeScore {
                    clause_type: *clause_type,
                    score,
                    occurrences,
                }
            })
            .filter(|s| s.score > 0)
            .collect();

        // Stable sort keeps declaration order for full ties
        scores.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.occurrences.cmp(&a.occurrences))
        });
        scores
    }
}

impl Default for ClauseClassifier {
    fn default() -> Self {
        Self::new()
    }
}
