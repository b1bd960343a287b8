//! Redline Risk - Perspective-aware clause risk engine
//!
//! Rules are grouped into a table keyed by `(ClauseType, Perspective)`.
//! Each table entry is an ordered rule list, most severe first; the first
//! matching rule decides the clause's level and rationale code.
//!
//! Author: hephaex@gmail.com

use std::path::PathBuf;

use redline_core::RedlineError;
use thiserror::Error;

pub mod engine;
pub mod playbook;
pub mod rules;

pub use engine::{aggregate_risk, ContractScore, RiskEngine, RuleSet, RuleTable, TableRule};
pub use playbook::{Playbook, PlaybookRule};
pub use rules::{builtin_rules, compile_pattern, EvalContext, Predicate, Rule};

/// Errors raised while building the rule table
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid pattern in rule {rule_id}: {source}")]
    InvalidPattern {
        rule_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule {rule_id} has no patterns")]
    EmptyPatterns { rule_id: String },

    #[error("Unknown perspective {value:?} in rule {rule_id}")]
    UnknownPerspective { rule_id: String, value: String },

    #[error("Unknown clause type {value:?} in rule {rule_id}")]
    UnknownClauseType { rule_id: String, value: String },

    #[error("Failed to read playbook {path}: {source}")]
    PlaybookRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse playbook: {0}")]
    PlaybookParse(#[from] serde_json::Error),
}

impl From<RiskError> for RedlineError {
    fn from(err: RiskError) -> Self {
        RedlineError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
