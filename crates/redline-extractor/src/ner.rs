//! Named Entity Recognition (NER) module
//!
//! Rule-based extraction of contract entities:
//! - Amounts: `$1,000.00`, `$2.5 million`, `5,000 dollars`, `USD 300`
//! - Dates: ISO, US numeric and long-form dates
//! - Durations: `30 days`, `thirty (30) days`, `six months`
//! - Parties: corporate names and defined roles
//! - Locations: `State of X`, `City, ST`, US state names
//!
//! Every match is normalised; a match that cannot be normalised is
//! discarded without error.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use redline_core::{Clause, Entity, EntityKind};

use crate::EntityExtractor;

// ============================================================================
// Dictionaries
// ============================================================================

/// US states and territories with their postal abbreviations
const US_STATES: [(&str, &str); 51] = [
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// Spelled-out numbers used in durations
const NUMBER_WORDS: [(&str, u32); 24] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("fourteen", 14),
    ("fifteen", 15),
    ("eighteen", 18),
    ("twenty", 20),
    ("twenty-four", 24),
    ("thirty", 30),
    ("thirty-six", 36),
    ("forty-five", 45),
    ("sixty", 60),
    ("ninety", 90),
    ("one hundred twenty", 120),
    ("one hundred eighty", 180),
];

const MONTHS: &str = r"Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?";

/// Amount with comma grouping checked during normalisation
const NUMBER: &str = r"(?P<num>\d(?:[\d,]*\d)?(?:\.\d+)?)";

static GROUPED_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(?:,\d{3})+$").expect("regex for digit grouping"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("regex for whitespace"));

fn state_by_name(name: &str) -> Option<&'static str> {
    US_STATES
        .iter()
        .find(|(state, _)| state.eq_ignore_ascii_case(name))
        .map(|(state, _)| *state)
}

fn is_state_abbreviation(abbr: &str) -> bool {
    US_STATES.iter().any(|(_, code)| *code == abbr)
}

fn number_word(word: &str) -> Option<u32> {
    let normalized = WHITESPACE.replace_all(&word.to_lowercase(), " ").into_owned();
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == normalized)
        .map(|(_, n)| *n)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let index = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ]
    .iter()
    .position(|m| *m == prefix)?;
    u32::try_from(index + 1).ok()
}

// ============================================================================
// Normalisation
// ============================================================================

/// How a pattern's captures become a normalised value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Normalizer {
    /// `num` + optional `scale` -> decimal with two places
    Amount,
    /// `y`, `m`, `d` numeric groups -> ISO date
    NumericDate,
    /// `month` name, `d`, `y` -> ISO date
    LongDate,
    /// `n` digits or `word` + `unit` -> ISO-8601 period
    Duration,
    /// Corporate name or defined role, whitespace collapsed
    Party,
    /// `State of X` / state name -> canonical state name
    State,
    /// `city` + `st` abbreviation, which must be a US state
    CityState,
}

impl Normalizer {
    fn apply(self, caps: &Captures<'_>) -> Option<String> {
        match self {
            Self::Amount => normalize_amount(caps),
            Self::NumericDate => normalize_numeric_date(caps),
            Self::LongDate => normalize_long_date(caps),
            Self::Duration => normalize_duration(caps),
            Self::Party => normalize_party(caps.get(0)?.as_str()),
            Self::State => normalize_state(caps),
            Self::CityState => normalize_city_state(caps),
        }
    }
}

fn normalize_amount(caps: &Captures<'_>) -> Option<String> {
    let raw = caps.name("num")?.as_str();
    let (integer, _) = raw.split_once('.').unwrap_or((raw, ""));
    if integer.contains(',') && !GROUPED_INTEGER.is_match(integer) {
        return None;
    }

    let value: f64 = raw.replace(',', "").parse().ok()?;
    let multiplier = match caps.name("scale").map(|s| s.as_str().to_lowercase()) {
        Some(scale) if scale == "thousand" => 1_000.0,
        Some(scale) if scale == "million" => 1_000_000.0,
        Some(scale) if scale == "billion" => 1_000_000_000.0,
        _ => 1.0,
    };

    let amount = value * multiplier;
    amount.is_finite().then(|| format!("{amount:.2}"))
}

fn normalize_numeric_date(caps: &Captures<'_>) -> Option<String> {
    let mut year: i32 = caps.name("y")?.as_str().parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    let month: u32 = caps.name("m")?.as_str().parse().ok()?;
    let day: u32 = caps.name("d")?.as_str().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn normalize_long_date(caps: &Captures<'_>) -> Option<String> {
    let year: i32 = caps.name("y")?.as_str().parse().ok()?;
    let month = month_number(caps.name("month")?.as_str())?;
    let day: u32 = caps.name("d")?.as_str().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn normalize_duration(caps: &Captures<'_>) -> Option<String> {
    let count = match (caps.name("n"), caps.name("word")) {
        (Some(n), _) => n.as_str().parse::<u32>().ok()?,
        (None, Some(word)) => number_word(word.as_str())?,
        (None, None) => return None,
    };

    let unit = match caps.name("unit")?.as_str().to_lowercase().as_str() {
        "day" => 'D',
        "week" => 'W',
        "month" => 'M',
        "year" => 'Y',
        _ => return None,
    };

    Some(format!("P{count}{unit}"))
}

fn normalize_party(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let name = collapsed
        .strip_prefix("The ")
        .unwrap_or(collapsed.as_ref())
        .trim_end_matches(',');
    (name.len() >= 3).then(|| name.to_string())
}

fn normalize_state(caps: &Captures<'_>) -> Option<String> {
    let name = caps.name("name")?.as_str();
    let collapsed = WHITESPACE.replace_all(name, " ");
    Some(
        state_by_name(&collapsed)
            .map(str::to_string)
            .unwrap_or_else(|| collapsed.into_owned()),
    )
}

fn normalize_city_state(caps: &Captures<'_>) -> Option<String> {
    let city = caps.name("city")?.as_str();
    let st = caps.name("st")?.as_str();
    is_state_abbreviation(st).then(|| format!("{city}, {st}"))
}

// ============================================================================
// Rule-based NER
// ============================================================================

/// One extraction rule
struct EntityPattern {
    regex: Regex,
    kind: EntityKind,
    normalizer: Normalizer,
}

/// A normalised match before overlap resolution
#[derive(Debug, Clone)]
struct Candidate {
    kind: EntityKind,
    value: String,
    normalized: String,
    start: usize,
    end: usize,
}

/// Rule-based NER using regex patterns and dictionaries
pub struct RuleBasedNer {
    patterns: Vec<EntityPattern>,
}

impl RuleBasedNer {
    /// Create a new NER with the default contract rules
    pub fn new() -> Self {
        let mut ner = Self {
            patterns: Vec::new(),
        };

        ner.init_amount_patterns();
        ner.init_date_patterns();
        ner.init_duration_patterns();
        ner.init_party_patterns();
        ner.init_location_patterns();
        ner
    }

    fn init_amount_patterns(&mut self) {
        let scale = r"(?:\s+(?P<scale>thousand|million|billion)\b)?";
        self.add_pattern(
            &format!(r"(?i)(?:\$|\bUS\$|\bUSD)\s?{NUMBER}{scale}(?:\s+(?:dollars?|USD)\b)?"),
            EntityKind::Amount,
            Normalizer::Amount,
        );
        self.add_pattern(
            &format!(r"(?i)\b{NUMBER}{scale}\s+(?:U\.S\.\s+)?(?:dollars?|USD)\b"),
            EntityKind::Amount,
            Normalizer::Amount,
        );
    }

    fn init_date_patterns(&mut self) {
        self.add_pattern(
            r"\b(?P<y>\d{4})-(?P<m>\d{1,2})-(?P<d>\d{1,2})\b",
            EntityKind::Date,
            Normalizer::NumericDate,
        );
        self.add_pattern(
            r"\b(?P<m>\d{1,2})[/-](?P<d>\d{1,2})[/-](?P<y>\d{4}|\d{2})\b",
            EntityKind::Date,
            Normalizer::NumericDate,
        );
        self.add_pattern(
            &format!(r"(?i)\b(?P<month>{MONTHS})\.?\s+(?P<d>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<y>\d{{4}})\b"),
            EntityKind::Date,
            Normalizer::LongDate,
        );
        self.add_pattern(
            &format!(r"(?i)\b(?P<d>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:day\s+of\s+)?(?P<month>{MONTHS})\.?,?\s+(?P<y>\d{{4}})\b"),
            EntityKind::Date,
            Normalizer::LongDate,
        );
    }

    fn init_duration_patterns(&mut self) {
        let words = NUMBER_WORDS
            .iter()
            .rev()
            .map(|(w, _)| w.replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");

        self.add_pattern(
            &format!(r"(?i)\b(?P<word>{words})\s*\((?P<n>\d+)\)\s*(?P<unit>day|week|month|year)s?\b"),
            EntityKind::Duration,
            Normalizer::Duration,
        );
        self.add_pattern(
            r"(?i)\b(?P<n>\d+)(?:\s*|-)(?P<unit>day|week|month|year)s?\b",
            EntityKind::Duration,
            Normalizer::Duration,
        );
        self.add_pattern(
            &format!(r"(?i)\b(?P<word>{words})(?:\s+|-)(?P<unit>day|week|month|year)s?\b"),
            EntityKind::Duration,
            Normalizer::Duration,
        );
    }

    fn init_party_patterns(&mut self) {
        self.add_pattern(
            r"\b[A-Z][\w&'-]*(?:\s+(?:[A-Z][\w&'-]*|of|and|&)){0,4},?\s+(?:Inc|LLC|L\.L\.C|Ltd|Limited|Corporation|Corp|Company|LLP|PLC|GmbH)\b\.?",
            EntityKind::Party,
            Normalizer::Party,
        );
        self.add_pattern(
            r"\b(?:Disclosing|Receiving)\s+Party\b|\bService\s+Provider\b|\b(?:Client|Contractor|Consultant|Vendor|Supplier|Customer|Employer|Employee|Licensor|Licensee|Buyer|Seller)\b",
            EntityKind::Party,
            Normalizer::Party,
        );
    }

    fn init_location_patterns(&mut self) {
        self.add_pattern(
            r"\b(?:State|Commonwealth)\s+of\s+(?P<name>[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\b",
            EntityKind::Location,
            Normalizer::State,
        );
        self.add_pattern(
            r"\b(?P<city>[A-Z][a-z]+(?:\s[A-Z][a-z]+)?),\s*(?P<st>[A-Z]{2})\b",
            EntityKind::Location,
            Normalizer::CityState,
        );

        let names = US_STATES
            .iter()
            .map(|(name, _)| name.replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        self.add_pattern(
            &format!(r"\b(?P<name>{names})\b"),
            EntityKind::Location,
            Normalizer::State,
        );
    }

    /// Add a regex pattern
    fn add_pattern(&mut self, pattern: &str, kind: EntityKind, normalizer: Normalizer) {
        if let Ok(regex) = Regex::new(pattern) {
            self.patterns.push(EntityPattern {
                regex,
                kind,
                normalizer,
            });
        }
    }

    /// Run every pattern, dropping matches that fail normalisation
    fn extract_by_patterns(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.regex.captures_iter(text) {
                let Some(mat) = caps.get(0) else { continue };
                let Some(normalized) = pattern.normalizer.apply(&caps) else {
                    continue;
                };

                let value = mat.as_str().trim_end_matches([',', ';', ':', ' ']);
                candidates.push(Candidate {
                    kind: pattern.kind,
                    value: value.to_string(),
                    normalized,
                    start: mat.start(),
                    end: mat.start() + value.len(),
                });
            }
        }

        candidates
    }

    /// Longest match wins per kind; repeated values of a kind are kept once
    fn resolve_overlaps(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut by_kind: HashMap<EntityKind, Vec<Candidate>> = HashMap::new();
        for candidate in candidates {
            by_kind.entry(candidate.kind).or_default().push(candidate);
        }

        let mut result = Vec::new();
        for (_, mut group) in by_kind {
            // Stable: earlier patterns win among equal spans
            group.sort_by_key(|c| (c.start, Reverse(c.end - c.start)));

            let mut covered_until = 0;
            let mut seen: HashSet<String> = HashSet::new();
            for candidate in group {
                if candidate.start < covered_until {
                    continue;
                }
                covered_until = candidate.end;
                if seen.insert(candidate.value.to_lowercase()) {
                    result.push(candidate);
                }
            }
        }

        result.sort_by_key(|c| (c.start, c.kind));
        result
    }

    /// Extract entities from raw text on behalf of a clause
    pub fn extract_text(&self, text: &str, clause_id: &str) -> Vec<Entity> {
        let candidates = self.extract_by_patterns(text);
        let entities: Vec<Entity> = self
            .resolve_overlaps(candidates)
            .into_iter()
            .map(|c| {
                Entity::new(c.kind, c.value, clause_id)
                    .with_normalized(c.normalized)
                    .with_span(c.start, c.end)
            })
            .collect();

        debug!(clause_id, count = entities.len(), "Entities extracted");
        entities
    }
}

impl Default for RuleBasedNer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor for RuleBasedNer {
    fn extract(&self, clause: &Clause) -> Vec<Entity> {
        if clause.unreadable {
            return Vec::new();
        }
        self.extract_text(&clause.text, &clause.id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Entity> {
        RuleBasedNer::new().extract_text(text, "1")
    }

    fn of_kind(entities: &[Entity], kind: EntityKind) -> Vec<(String, String)> {
        entities
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| (e.value.clone(), e.normalized_value.clone().unwrap_or_default()))
            .collect()
    }

    #[test]
    fn test_amounts() {
        let entities = extract(
            "Fees of $1,000.00 plus $2.5 million, a deposit of 5,000 dollars and USD 300.",
        );
        let amounts = of_kind(&entities, EntityKind::Amount);
        let normalized: Vec<&str> = amounts.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(
            normalized,
            vec!["1000.00", "2500000.00", "5000.00", "300.00"]
        );
        assert_eq!(amounts[1].0, "$2.5 million");
    }

    #[test]
    fn test_bad_grouping_is_dropped() {
        let entities = extract("A fee of $1,00 is due.");
        assert!(of_kind(&entities, EntityKind::Amount).is_empty());
    }

    #[test]
    fn test_dates() {
        let entities = extract(
            "Effective 2024-01-15, renewed on 03/31/2025, signed January 5, 2024 and 5th January 2024.",
        );
        let dates: Vec<String> = of_kind(&entities, EntityKind::Date)
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(
            dates,
            vec!["2024-01-15", "2025-03-31", "2024-01-05", "2024-01-05"]
        );
    }

    #[test]
    fn test_impossible_date_is_dropped() {
        let entities = extract("Due on 2024-02-30 or 13/45/2024.");
        assert!(of_kind(&entities, EntityKind::Date).is_empty());
    }

    #[test]
    fn test_durations() {
        let entities =
            extract("Notice of thirty (30) days, a term of six months, then 2 years and 10-day cure.");
        let durations = of_kind(&entities, EntityKind::Duration);
        let normalized: Vec<&str> = durations.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(normalized, vec!["P30D", "P6M", "P2Y", "P10D"]);
        assert_eq!(durations[0].0, "thirty (30) days");
    }

    #[test]
    fn test_parties() {
        let entities = extract(
            "Acme Widgets, Inc. and Globex Corporation agree that the Receiving Party and the Service Provider shall comply.",
        );
        let parties: Vec<String> = of_kind(&entities, EntityKind::Party)
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(
            parties,
            vec![
                "Acme Widgets, Inc.",
                "Globex Corporation",
                "Receiving Party",
                "Service Provider"
            ]
        );
    }

    #[test]
    fn test_locations() {
        let entities = extract(
            "Governed by the laws of the State of New York, with venue in Austin, TX and Delaware.",
        );
        let locations: Vec<String> = of_kind(&entities, EntityKind::Location)
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(locations, vec!["New York", "Austin, TX", "Delaware"]);
    }

    #[test]
    fn test_unknown_state_abbreviation_is_dropped() {
        let entities = extract("Offices in Springfield, ZZ only.");
        assert!(of_kind(&entities, EntityKind::Location).is_empty());
    }

    #[test]
    fn test_repeated_values_reported_once() {
        let entities = extract("The Vendor pays. The Vendor delivers. The vendor invoices.");
        let parties = of_kind(&entities, EntityKind::Party);
        assert_eq!(parties.len(), 1);
    }

    #[test]
    fn test_spans_and_clause_id() {
        let text = "Pay $500 within 10 days.";
        let entities = RuleBasedNer::new().extract_text(text, "7");
        assert!(entities.iter().all(|e| e.clause_id == "7"));
        for entity in &entities {
            assert_eq!(&text[entity.start..entity.end], entity.value);
        }
        let starts: Vec<usize> = entities.iter().map(|e| e.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_unreadable_clause_has_no_entities() {
        let mut clause = Clause::new("3", "Payment", "$500 due", 3, redline_core::ClauseType::Payment);
        clause.unreadable = true;
        assert!(RuleBasedNer::new().extract(&clause).is_empty());
    }

    #[test]
    fn test_no_entities() {
        assert!(extract("The parties agree to cooperate in good faith.").is_empty());
    }

    #[test]
    fn test_normalized_values_feed_scoring() {
        let entities = extract("Liability is capped at $25,000 and notice is 15 days.");
        let amount = entities
            .iter()
            .find(|e| e.kind == EntityKind::Amount)
            .unwrap();
        assert_eq!(amount.amount().unwrap(), 25_000.0);
        let duration = entities
            .iter()
            .find(|e| e.kind == EntityKind::Duration)
            .unwrap();
        assert_eq!(duration.duration_days().unwrap(), 15);
    }
}
