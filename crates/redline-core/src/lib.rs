//! Redline Core - Domain models, traits, and shared types
//!
//! This crate defines the abstractions shared by every pipeline stage:
//! - Clause, entity and risk models
//! - The contract report returned to callers
//! - Error taxonomy (request-fatal vs. locally recovered)
//! - The LLM client trait
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;

pub use config::{
    AppConfig, ClauseThresholds, ConfigError, LlmConfig, LlmProvider, LoggingConfig,
    PerspectiveThresholds, PipelineConfig, RiskConfig, SegmentationConfig, ThresholdKey,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced by the analysis pipeline
///
/// Only `ParseFailed` ever reaches the caller of an analysis request; every
/// other stage-local fault is downgraded to a per-item default.
#[derive(Error, Debug)]
pub enum RedlineError {
    #[error("Unable to extract readable text from the document: {reason}. Ensure the file is not corrupted and contains readable text.")]
    ParseFailed { reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RedlineError {
    /// Create a parse failure with a user-facing reason
    pub fn parse_failed(reason: impl Into<String>) -> Self {
        Self::ParseFailed {
            reason: reason.into(),
        }
    }

    /// Whether this error is the request-fatal parse failure
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::ParseFailed { .. })
    }
}

impl From<ConfigError> for RedlineError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RedlineError>;

/// Internal fault while scoring one clause; the clause falls back to LOW/`engine_error`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClauseScoringError {
    #[error("Malformed {kind} entity value: {value:?}")]
    MalformedEntity { kind: EntityKind, value: String },

    #[error("Scoring task for clause {clause_id} panicked")]
    Panicked { clause_id: String },
}

/// The LLM path could not produce an explanation; the template fallback is used
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplanationUnavailable {
    #[error("LLM explanations are disabled")]
    Disabled,

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Explanation request was cancelled")]
    Cancelled,

    #[error("LLM provider error: {0}")]
    Provider(String),

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("LLM response was generic: {0}")]
    GenericResponse(String),
}

// ============================================================================
// Taxonomy
// ============================================================================

/// Closed taxonomy of clause types
///
/// Declaration order is significant: classification ties are resolved in
/// favour of the type listed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseType {
    Indemnification,
    Termination,
    Liability,
    Payment,
    Confidentiality,
    IntellectualProperty,
    GoverningLaw,
    DisputeResolution,
    NonCompete,
    Warranty,
    ForceMajeure,
    Assignment,
    Amendment,
    Severability,
    EntireAgreement,
    General,
}

impl ClauseType {
    /// All clause types in declaration order
    pub const ALL: [ClauseType; 16] = [
        Self::Indemnification,
        Self::Termination,
        Self::Liability,
        Self::Payment,
        Self::Confidentiality,
        Self::IntellectualProperty,
        Self::GoverningLaw,
        Self::DisputeResolution,
        Self::NonCompete,
        Self::Warranty,
        Self::ForceMajeure,
        Self::Assignment,
        Self::Amendment,
        Self::Severability,
        Self::EntireAgreement,
        Self::General,
    ];

    /// Get the serialized string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indemnification => "indemnification",
            Self::Termination => "termination",
            Self::Liability => "liability",
            Self::Payment => "payment",
            Self::Confidentiality => "confidentiality",
            Self::IntellectualProperty => "intellectual_property",
            Self::GoverningLaw => "governing_law",
            Self::DisputeResolution => "dispute_resolution",
            Self::NonCompete => "non_compete",
            Self::Warranty => "warranty",
            Self::ForceMajeure => "force_majeure",
            Self::Assignment => "assignment",
            Self::Amendment => "amendment",
            Self::Severability => "severability",
            Self::EntireAgreement => "entire_agreement",
            Self::General => "general",
        }
    }

    /// Human readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Indemnification => "Indemnification",
            Self::Termination => "Termination",
            Self::Liability => "Liability",
            Self::Payment => "Payment",
            Self::Confidentiality => "Confidentiality",
            Self::IntellectualProperty => "Intellectual Property",
            Self::GoverningLaw => "Governing Law",
            Self::DisputeResolution => "Dispute Resolution",
            Self::NonCompete => "Non-Compete",
            Self::Warranty => "Warranty",
            Self::ForceMajeure => "Force Majeure",
            Self::Assignment => "Assignment",
            Self::Amendment => "Amendment",
            Self::Severability => "Severability",
            Self::EntireAgreement => "Entire Agreement",
            Self::General => "General",
        }
    }
}

impl std::fmt::Display for ClauseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClauseType {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "indemnity" => return Ok(Self::Indemnification),
            "ip" => return Ok(Self::IntellectualProperty),
            "legal_terms" => return Ok(Self::General),
            _ => {}
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| RedlineError::ValidationError(format!("unknown clause type: {s}")))
    }
}

/// Clause risk level, ordered `Low < Medium < High`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Levels from most to least severe
    pub const DESCENDING: [RiskLevel; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(RedlineError::ValidationError(format!(
                "unknown risk level: {s}"
            ))),
        }
    }
}

/// Negotiating role the contract is read from
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    Vendor,
    Buyer,
    Employer,
    Employee,
    Disclosing,
    #[default]
    Receiving,
}

impl Perspective {
    pub const ALL: [Perspective; 6] = [
        Self::Vendor,
        Self::Buyer,
        Self::Employer,
        Self::Employee,
        Self::Disclosing,
        Self::Receiving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Buyer => "buyer",
            Self::Employer => "employer",
            Self::Employee => "employee",
            Self::Disclosing => "disclosing",
            Self::Receiving => "receiving",
        }
    }

    /// Roles that usually sign paper drafted by the other side
    pub fn is_counterparty_drafted(&self) -> bool {
        matches!(self, Self::Employee | Self::Receiving | Self::Vendor)
    }
}

impl std::fmt::Display for Perspective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Perspective {
    type Err = RedlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "vendor" | "supplier" | "provider" | "service_provider" => Ok(Self::Vendor),
            "buyer" | "client" | "customer" => Ok(Self::Buyer),
            "employer" => Ok(Self::Employer),
            "employee" => Ok(Self::Employee),
            "disclosing" | "discloser" => Ok(Self::Disclosing),
            "receiving" | "receiver" | "recipient" => Ok(Self::Receiving),
            _ => Err(RedlineError::ValidationError(format!(
                "unknown perspective: {s} (expected vendor, buyer, employer, employee, disclosing or receiving)"
            ))),
        }
    }
}

// ============================================================================
// Clauses
// ============================================================================

/// A segmented span of contract text, before classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseSegment {
    /// Stable ordinal-based identifier ("1", "2.1")
    pub id: String,

    /// Heading text, or a generated title
    pub title: String,

    /// Sanitized clause body
    pub text: String,

    /// 1-based position in document order
    pub ordinal: u32,

    /// Parent clause for numbered sub-clauses
    pub parent_id: Option<String>,

    /// Set when the span was binary noise and `text` is the empty-quote fallback
    pub unreadable: bool,
}

impl ClauseSegment {
    /// Create a new segment
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        ordinal: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            ordinal,
            parent_id: None,
            unreadable: false,
        }
    }

    /// Set the parent clause id
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Approximate word count of the body
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Attach a classification, producing the immutable clause record
    pub fn into_clause(self, classification: Classification) -> Clause {
        Clause {
            id: self.id,
            title: self.title,
            text: self.text,
            ordinal: self.ordinal,
            primary_type: classification.primary,
            secondary_types: classification.secondary,
            parent_id: self.parent_id,
            unreadable: self.unreadable,
        }
    }
}

/// Result of clause classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub primary: ClauseType,
    pub secondary: Vec<ClauseType>,
}

impl Classification {
    pub fn new(primary: ClauseType) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
        }
    }

    /// Classification for clauses no keyword matched
    pub fn general() -> Self {
        Self::new(ClauseType::General)
    }

    pub fn with_secondary(mut self, secondary: Vec<ClauseType>) -> Self {
        self.secondary = secondary;
        self
    }
}

/// A classified clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub id: String,
    pub title: String,
    pub text: String,
    pub ordinal: u32,
    pub primary_type: ClauseType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_types: Vec<ClauseType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unreadable: bool,
}

impl Clause {
    /// Create a clause directly (segments normally go through `ClauseSegment::into_clause`)
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        ordinal: u32,
        primary_type: ClauseType,
    ) -> Self {
        ClauseSegment::new(id, title, text, ordinal).into_clause(Classification::new(primary_type))
    }

    /// First `max_chars` characters of the body, cut on a char boundary
    pub fn excerpt(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &self.text[..idx]),
            None => self.text.clone(),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Kinds of structured entities pulled from clause text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Date,
    Amount,
    Party,
    Duration,
    Location,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        Self::Date,
        Self::Amount,
        Self::Party,
        Self::Duration,
        Self::Location,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "DATE",
            Self::Amount => "AMOUNT",
            Self::Party => "PARTY",
            Self::Duration => "DURATION",
            Self::Location => "LOCATION",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entity extracted from one clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,

    /// Matched text as it appears in the clause
    pub value: String,

    /// Canonical form (decimal amount, ISO date, ISO-8601 period)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_value: Option<String>,

    pub clause_id: String,

    /// Byte offsets within the clause text
    pub start: usize,
    pub end: usize,
}

impl Entity {
    pub fn new(kind: EntityKind, value: impl Into<String>, clause_id: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            normalized_value: None,
            clause_id: clause_id.into(),
            start: 0,
            end: 0,
        }
    }

    pub fn with_normalized(mut self, normalized: impl Into<String>) -> Self {
        self.normalized_value = Some(normalized.into());
        self
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    fn malformed(&self) -> ClauseScoringError {
        ClauseScoringError::MalformedEntity {
            kind: self.kind,
            value: self
                .normalized_value
                .clone()
                .unwrap_or_else(|| self.value.clone()),
        }
    }

    /// Monetary value of an AMOUNT entity
    pub fn amount(&self) -> std::result::Result<f64, ClauseScoringError> {
        self.normalized_value
            .as_deref()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.malformed())
    }

    /// Length in days of a DURATION entity (`P30D`, `P2W`, `P6M`, `P3Y`)
    ///
    /// Months count as 30 days and years as 365 days.
    pub fn duration_days(&self) -> std::result::Result<u32, ClauseScoringError> {
        let period = self
            .normalized_value
            .as_deref()
            .and_then(|v| v.strip_prefix('P'))
            .ok_or_else(|| self.malformed())?;

        let unit = period.chars().last().ok_or_else(|| self.malformed())?;
        let count: u32 = period[..period.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| self.malformed())?;

        let factor = match unit {
            'D' => 1,
            'W' => 7,
            'M' => 30,
            'Y' => 365,
            _ => return Err(self.malformed()),
        };

        count.checked_mul(factor).ok_or_else(|| self.malformed())
    }
}

// ============================================================================
// Risk Analysis
// ============================================================================

/// Rationale code used when no rule in the table matched
pub const RATIONALE_NO_RULE_MATCHED: &str = "no_rule_matched";

/// Rationale code used when scoring the clause failed internally
pub const RATIONALE_ENGINE_ERROR: &str = "engine_error";

/// Reviewer-facing text attached to a risk rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGuidance {
    pub rule_name: String,
    pub description: String,
    pub why_risky: String,
    pub recommendation: String,
    pub redline_suggestion: Option<String>,

    /// Description override per negotiating role
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub perspective_descriptions: BTreeMap<Perspective, String>,
}

impl RuleGuidance {
    /// Description framed for the given perspective
    pub fn description_for(&self, perspective: Perspective) -> &str {
        self.perspective_descriptions
            .get(&perspective)
            .map(String::as_str)
            .unwrap_or(&self.description)
    }
}

/// Risk engine verdict for one clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub clause_id: String,
    pub risk_level: RiskLevel,
    pub rationale_code: String,
    pub matched_rule_ids: BTreeSet<String>,
}

impl ClauseAnalysis {
    /// Verdict produced by a matching rule
    pub fn matched(
        clause_id: impl Into<String>,
        risk_level: RiskLevel,
        rationale_code: impl Into<String>,
        rule_id: impl Into<String>,
    ) -> Self {
        Self {
            clause_id: clause_id.into(),
            risk_level,
            rationale_code: rationale_code.into(),
            matched_rule_ids: BTreeSet::from([rule_id.into()]),
        }
    }

    pub fn no_rule_matched(clause_id: impl Into<String>) -> Self {
        Self {
            clause_id: clause_id.into(),
            risk_level: RiskLevel::Low,
            rationale_code: RATIONALE_NO_RULE_MATCHED.to_string(),
            matched_rule_ids: BTreeSet::new(),
        }
    }

    pub fn engine_error(clause_id: impl Into<String>) -> Self {
        Self {
            clause_id: clause_id.into(),
            risk_level: RiskLevel::Low,
            rationale_code: RATIONALE_ENGINE_ERROR.to_string(),
            matched_rule_ids: BTreeSet::new(),
        }
    }

    /// Whether this clause needs an explanation under the given threshold
    pub fn is_flagged(&self, threshold: RiskLevel) -> bool {
        self.risk_level >= threshold
    }
}

// ============================================================================
// Explanations
// ============================================================================

/// Provenance of generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationSource {
    Llm,
    Fallback,
}

impl std::fmt::Display for ExplanationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Llm => write!(f, "llm"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// The four text fields of a clause explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationText {
    pub summary: String,
    pub why_risky: String,
    pub recommendation: String,
    pub redline_suggestion: String,
}

impl ExplanationText {
    /// All four fields carry non-whitespace text
    pub fn is_complete(&self) -> bool {
        [
            &self.summary,
            &self.why_risky,
            &self.recommendation,
            &self.redline_suggestion,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// Explanation attached to a clause at or above the explanation threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskyClauseExplanation {
    pub clause_id: String,
    pub clause_title: String,
    pub clause_type: ClauseType,
    pub risk_level: RiskLevel,
    pub rationale_code: String,
    pub summary: String,
    pub why_risky: String,
    pub recommendation: String,
    pub redline_suggestion: String,
    pub source: ExplanationSource,
}

impl RiskyClauseExplanation {
    pub fn new(
        clause: &Clause,
        analysis: &ClauseAnalysis,
        text: ExplanationText,
        source: ExplanationSource,
    ) -> Self {
        Self {
            clause_id: clause.id.clone(),
            clause_title: clause.title.clone(),
            clause_type: clause.primary_type,
            risk_level: analysis.risk_level,
            rationale_code: analysis.rationale_code.clone(),
            summary: text.summary,
            why_risky: text.why_risky,
            recommendation: text.recommendation,
            redline_suggestion: text.redline_suggestion,
            source,
        }
    }

    pub fn is_complete(&self) -> bool {
        [
            &self.summary,
            &self.why_risky,
            &self.recommendation,
            &self.redline_suggestion,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

// ============================================================================
// Contract Report
// ============================================================================

/// Contract-level counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStatistics {
    pub total_clauses: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,

    /// Clauses at or above the explanation threshold
    pub total_issues: usize,

    pub by_clause_type: BTreeMap<ClauseType, usize>,
    pub by_entity_kind: BTreeMap<EntityKind, usize>,
}

/// Risk section of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// Worst-case level over all clauses
    pub overall_risk_level: RiskLevel,

    /// Saturating 0-100 contract score
    pub risk_score: u32,

    /// `risk_score` banded by the configured thresholds
    pub score_level: RiskLevel,

    pub clause_analyses: Vec<ClauseAnalysis>,
}

/// Explanation section of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationReport {
    pub executive_summary: String,
    pub summary_source: ExplanationSource,
    pub statistics: ReportStatistics,
    pub issues: Vec<RiskyClauseExplanation>,
    pub overall_recommendations: Vec<String>,
}

/// Final, immutable result of one analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractReport {
    pub report_id: Uuid,
    pub filename: String,
    pub perspective: Perspective,
    pub generated_at: DateTime<Utc>,
    pub clauses: Vec<Clause>,
    pub entities: Vec<Entity>,
    pub risk_analysis: RiskAnalysis,
    pub explanations: ExplanationReport,
}

impl ContractReport {
    /// Risk verdict for a clause
    pub fn analysis_for(&self, clause_id: &str) -> Option<&ClauseAnalysis> {
        self.risk_analysis
            .clause_analyses
            .iter()
            .find(|a| a.clause_id == clause_id)
    }

    /// Explanation for a clause, if it was flagged
    pub fn explanation_for(&self, clause_id: &str) -> Option<&RiskyClauseExplanation> {
        self.explanations
            .issues
            .iter()
            .find(|e| e.clause_id == clause_id)
    }

    /// Entities extracted from a clause
    pub fn entities_for<'a>(&'a self, clause_id: &'a str) -> impl Iterator<Item = &'a Entity> {
        self.entities.iter().filter(move |e| e.clause_id == clause_id)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
