//! JSON rule playbooks
//!
//! A playbook adds organisation-specific rules on top of the built-in set.
//! Keys are camelCase:
//!
//! ```json
//! {
//!   "name": "Procurement",
//!   "rules": [{
//!     "ruleId": "PB001",
//!     "name": "Exclusive Supplier",
//!     "clauseTypes": ["GENERAL"],
//!     "patterns": ["\\bexclusive\\s+supplier\\b"],
//!     "riskLevel": "HIGH",
//!     "perspectiveRiskLevels": { "vendor": "LOW" },
//!     "description": "Buyer is locked to one supplier",
//!     "whyRisky": "...",
//!     "recommendation": "..."
//!   }]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use redline_core::{ClauseType, Perspective, RiskLevel};

use crate::rules::{Predicate, Rule};
use crate::{Result, RiskError};

/// A playbook file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playbook {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub rules: Vec<PlaybookRule>,
}

/// One rule as written in a playbook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookRule {
    pub rule_id: String,
    pub name: String,

    /// Defaults to the lowercased rule id
    #[serde(default)]
    pub rationale_code: Option<String>,

    /// Empty means every clause type
    #[serde(default)]
    pub clause_types: Vec<String>,

    pub patterns: Vec<String>,
    pub risk_level: RiskLevel,

    #[serde(default)]
    pub perspectives: Option<Vec<String>>,

    #[serde(default)]
    pub perspective_risk_levels: HashMap<String, RiskLevel>,

    #[serde(default)]
    pub perspective_descriptions: HashMap<String, String>,

    pub description: String,
    pub why_risky: String,
    pub recommendation: String,

    #[serde(default)]
    pub redline_suggestion: Option<String>,
}

impl Playbook {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RiskError::PlaybookRead {
            path: path.to_path_buf(),
            source,
        })?;
        let playbook = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            rules = playbook.rules.len(),
            "Loaded playbook"
        );
        Ok(playbook)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Compile every rule; the first invalid rule rejects the playbook
    pub fn into_rules(self) -> Result<Vec<Rule>> {
        self.rules.into_iter().map(PlaybookRule::into_rule).collect()
    }
}

impl PlaybookRule {
    fn perspective(&self, value: &str) -> Result<Perspective> {
        value.parse().map_err(|_| RiskError::UnknownPerspective {
            rule_id: self.rule_id.clone(),
            value: value.to_string(),
        })
    }

    pub fn into_rule(self) -> Result<Rule> {
        if self.patterns.is_empty() {
            return Err(RiskError::EmptyPatterns {
                rule_id: self.rule_id,
            });
        }

        let predicate =
            Predicate::any_pattern(&self.patterns).map_err(|source| RiskError::InvalidPattern {
                rule_id: self.rule_id.clone(),
                source,
            })?;

        let clause_types = if self.clause_types.is_empty() {
            ClauseType::ALL.to_vec()
        } else {
            self.clause_types
                .iter()
                .map(|t| {
                    t.parse::<ClauseType>()
                        .map_err(|_| RiskError::UnknownClauseType {
                            rule_id: self.rule_id.clone(),
                            value: t.clone(),
                        })
                })
                .collect::<Result<Vec<_>>>()?
        };

        let perspectives = match &self.perspectives {
            Some(list) => Some(
                list.iter()
                    .map(|p| self.perspective(p))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        let rationale_code = self
            .rationale_code
            .clone()
            .unwrap_or_else(|| self.rule_id.to_lowercase());

        let mut rule = Rule::new(
            &self.rule_id,
            &self.name,
            rationale_code,
            self.risk_level,
            predicate,
        )
        .scoped(&clause_types)
        .with_guidance(
            &self.description,
            &self.why_risky,
            &self.recommendation,
            self.redline_suggestion.as_deref().unwrap_or_default(),
        );
        rule.perspectives = perspectives;

        for (name, level) in &self.perspective_risk_levels {
            rule = rule.with_level(self.perspective(name)?, *level);
        }
        for (name, description) in &self.perspective_descriptions {
            rule = rule.with_description_for(self.perspective(name)?, description);
        }

        Ok(rule)
    }
}
