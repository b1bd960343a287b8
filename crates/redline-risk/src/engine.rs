//! Risk engine
//!
//! Rules are indexed into a table keyed by `(clause type, perspective)`.
//! Each entry holds the applicable rules ordered by descending risk level
//! (declaration order within a level) together with the numeric thresholds
//! of the perspective. Scoring walks the entry and stops at the first
//! matching rule, so the verdict is always the most severe match.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use redline_core::{
    Clause, ClauseAnalysis, ClauseScoringError, ClauseThresholds, ClauseType, Entity,
    Perspective, RiskAnalysis, RiskConfig, RiskLevel, RuleGuidance,
};

use crate::playbook::Playbook;
use crate::rules::{builtin_rules, EvalContext, Rule};
use crate::Result;

// ============================================================================
// Rule Table
// ============================================================================

/// A rule placed in a table entry, with its level already resolved
#[derive(Debug, Clone)]
pub struct TableRule {
    pub rule: Arc<Rule>,
    pub level: RiskLevel,
}

/// Rules for one `(clause type, perspective)` pair
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub thresholds: ClauseThresholds,

    /// Highest level first
    pub rules: Vec<TableRule>,
}

impl RuleSet {
    fn build(
        rules: &[Arc<Rule>],
        clause_type: ClauseType,
        perspective: Perspective,
        thresholds: ClauseThresholds,
    ) -> Self {
        let mut entries: Vec<TableRule> = rules
            .iter()
            .filter(|r| r.applies_to(clause_type, perspective))
            .map(|r| TableRule {
                rule: Arc::clone(r),
                level: r.level_for(perspective),
            })
            .collect();

        // Stable: declaration order survives within a level
        entries.sort_by(|a, b| b.level.cmp(&a.level));

        Self {
            thresholds,
            rules: entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Precomputed lookup from `(clause type, perspective)` to its rule set
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    entries: HashMap<(ClauseType, Perspective), RuleSet>,
}

impl RuleTable {
    pub fn build(rules: &[Arc<Rule>], config: &RiskConfig) -> Self {
        let mut entries = HashMap::new();
        for perspective in Perspective::ALL {
            let thresholds = config.thresholds_for(perspective);
            for clause_type in ClauseType::ALL {
                entries.insert(
                    (clause_type, perspective),
                    RuleSet::build(rules, clause_type, perspective, thresholds),
                );
            }
        }
        Self { entries }
    }

    pub fn get(&self, clause_type: ClauseType, perspective: Perspective) -> Option<&RuleSet> {
        self.entries.get(&(clause_type, perspective))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Deterministic clause scorer
#[derive(Debug, Clone)]
pub struct RiskEngine {
    table: RuleTable,
    rules: Vec<Arc<Rule>>,
    config: RiskConfig,
}

impl RiskEngine {
    /// Engine over the built-in rules
    pub fn new(config: &RiskConfig) -> Result<Self> {
        Ok(Self::with_rules(builtin_rules()?, config))
    }

    /// Engine over an explicit rule list, in declaration order
    pub fn with_rules(rules: Vec<Rule>, config: &RiskConfig) -> Self {
        let rules: Vec<Arc<Rule>> = rules.into_iter().map(Arc::new).collect();
        let table = RuleTable::build(&rules, config);
        debug!(rules = rules.len(), entries = table.len(), "Rule table built");
        Self {
            table,
            rules,
            config: config.clone(),
        }
    }

    /// Built-in rules followed by the rules of a playbook file
    pub fn with_playbook(config: &RiskConfig, path: impl AsRef<Path>) -> Result<Self> {
        let mut rules = builtin_rules()?;
        rules.extend(Playbook::from_file(path)?.into_rules()?);
        Ok(Self::with_rules(rules, config))
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules().find(|r| r.id == id)
    }

    pub fn rule_set(&self, clause_type: ClauseType, perspective: Perspective) -> Option<&RuleSet> {
        self.table.get(clause_type, perspective)
    }

    /// Guidance of the rule that produced a verdict
    pub fn guidance(&self, analysis: &ClauseAnalysis) -> Option<&RuleGuidance> {
        analysis
            .matched_rule_ids
            .iter()
            .next()
            .and_then(|id| self.rule(id))
            .map(|r| &r.guidance)
    }

    /// Score one clause, surfacing internal faults
    pub fn try_score_clause(
        &self,
        clause: &Clause,
        entities: &[Entity],
        perspective: Perspective,
    ) -> std::result::Result<ClauseAnalysis, ClauseScoringError> {
        let Some(rule_set) = self.table.get(clause.primary_type, perspective) else {
            return Ok(ClauseAnalysis::no_rule_matched(&clause.id));
        };

        let ctx = EvalContext::new(&clause.text, entities, &rule_set.thresholds);
        for entry in &rule_set.rules {
            if entry.rule.predicate.evaluate(&ctx)? {
                return Ok(ClauseAnalysis::matched(
                    &clause.id,
                    entry.level,
                    &entry.rule.rationale_code,
                    &entry.rule.id,
                ));
            }
        }

        Ok(ClauseAnalysis::no_rule_matched(&clause.id))
    }

    /// Score one clause; internal faults become LOW/`engine_error`
    pub fn score_clause(
        &self,
        clause: &Clause,
        entities: &[Entity],
        perspective: Perspective,
    ) -> ClauseAnalysis {
        match self.try_score_clause(clause, entities, perspective) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(clause_id = %clause.id, error = %e, "Clause scoring failed");
                ClauseAnalysis::engine_error(&clause.id)
            }
        }
    }

    /// Contract-level aggregation of per-clause verdicts
    pub fn assess(&self, clause_analyses: Vec<ClauseAnalysis>) -> RiskAnalysis {
        let score = ContractScore::compute(&clause_analyses, &self.config);
        RiskAnalysis {
            overall_risk_level: aggregate_risk(&clause_analyses),
            risk_score: score.score,
            score_level: score.level,
            clause_analyses,
        }
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Worst-case level over all clauses; LOW for an empty contract
pub fn aggregate_risk(analyses: &[ClauseAnalysis]) -> RiskLevel {
    analyses
        .iter()
        .map(|a| a.risk_level)
        .max()
        .unwrap_or(RiskLevel::Low)
}

/// Saturating 0-100 contract score and its band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractScore {
    pub score: u32,
    pub level: RiskLevel,
}

impl ContractScore {
    pub fn compute(analyses: &[ClauseAnalysis], config: &RiskConfig) -> Self {
        let raw = analyses
            .iter()
            .map(|a| match a.risk_level {
                RiskLevel::High => config.high_clause_points,
                RiskLevel::Medium => config.medium_clause_points,
                RiskLevel::Low => 0,
            })
            .fold(0u32, u32::saturating_add);
        let score = raw.min(100);

        let level = if score >= config.high_risk_threshold {
            RiskLevel::High
        } else if score >= config.medium_risk_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        Self { score, level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Predicate;
    use redline_core::{EntityKind, RATIONALE_ENGINE_ERROR, RATIONALE_NO_RULE_MATCHED};

    fn engine() -> RiskEngine {
        RiskEngine::new(&RiskConfig::default()).unwrap()
    }

    fn clause(clause_type: ClauseType, text: &str) -> Clause {
        Clause::new("1", "", text, 1, clause_type)
    }

    #[test]
    fn test_table_covers_every_pair() {
        let engine = engine();
        assert_eq!(
            engine.table.len(),
            ClauseType::ALL.len() * Perspective::ALL.len()
        );
        for clause_type in ClauseType::ALL {
            for perspective in Perspective::ALL {
                assert!(engine.rule_set(clause_type, perspective).is_some());
            }
        }
    }

    #[test]
    fn test_rule_sets_are_ordered_by_level() {
        let engine = engine();
        for perspective in Perspective::ALL {
            let set = engine
                .rule_set(ClauseType::Termination, perspective)
                .unwrap();
            assert!(set.rules.windows(2).all(|w| w[0].level >= w[1].level));
        }
    }

    #[test]
    fn test_uncapped_indemnity_is_high() {
        let engine = engine();
        let clause = clause(
            ClauseType::Indemnification,
            "Receiving Party shall indemnify Disclosing Party without limitation as to amount or duration.",
        );

        for perspective in [Perspective::Vendor, Perspective::Receiving] {
            let analysis = engine.score_clause(&clause, &[], perspective);
            assert_eq!(analysis.risk_level, RiskLevel::High);
            assert_eq!(analysis.rationale_code, "uncapped_liability");
            assert!(analysis.matched_rule_ids.contains("IND001"));
        }
    }

    #[test]
    fn test_plain_governing_law_is_low() {
        let engine = engine();
        let clause = clause(
            ClauseType::General,
            "This Agreement shall be governed by the laws of Delaware.",
        );

        for perspective in [Perspective::Vendor, Perspective::Buyer] {
            let analysis = engine.score_clause(&clause, &[], perspective);
            assert_eq!(analysis.risk_level, RiskLevel::Low);
            assert_eq!(analysis.rationale_code, RATIONALE_NO_RULE_MATCHED);
            assert!(analysis.matched_rule_ids.is_empty());
        }
    }

    #[test]
    fn test_most_severe_match_wins() {
        let engine = engine();
        let clause = clause(
            ClauseType::Termination,
            "The Company may terminate this Agreement at any time, effective immediately.",
        );

        // TERM001 (HIGH) and TERM002 (MEDIUM) both match for an employee
        let analysis = engine.score_clause(&clause, &[], Perspective::Employee);
        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert_eq!(analysis.rationale_code, "at_will_termination");
        assert_eq!(analysis.matched_rule_ids.len(), 1);

        // TERM001 drops to LOW for an employer, so TERM002 wins
        let analysis = engine.score_clause(&clause, &[], Perspective::Employer);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.rationale_code, "immediate_termination");
    }

    #[test]
    fn test_perspective_changes_the_level() {
        let engine = engine();
        let clause = clause(
            ClauseType::Warranty,
            "The software is provided as is, with no warranty of any kind.",
        );

        let levels: Vec<RiskLevel> = [Perspective::Buyer, Perspective::Receiving, Perspective::Vendor]
            .into_iter()
            .map(|p| engine.score_clause(&clause, &[], p).risk_level)
            .collect();
        assert_eq!(levels, vec![RiskLevel::High, RiskLevel::Medium, RiskLevel::Low]);
    }

    #[test]
    fn test_malformed_entity_yields_engine_error() {
        let engine = engine();
        let clause = clause(
            ClauseType::Liability,
            "Aggregate liability shall not exceed the fees paid.",
        );
        let broken = Entity::new(EntityKind::Amount, "$1,00,0", "1").with_normalized("1,00,0");

        assert!(engine
            .try_score_clause(&clause, std::slice::from_ref(&broken), Perspective::Buyer)
            .is_err());

        let analysis = engine.score_clause(&clause, &[broken], Perspective::Buyer);
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert_eq!(analysis.rationale_code, RATIONALE_ENGINE_ERROR);
    }

    #[test]
    fn test_thresholds_follow_perspective() {
        let engine = engine();
        let clause = clause(
            ClauseType::Liability,
            "Aggregate liability shall not exceed $75,000.",
        );
        let cap = Entity::new(EntityKind::Amount, "$75,000", "1").with_normalized("75000.00");

        // buyer floor is 100,000; default floor is 50,000
        let buyer = engine.score_clause(&clause, std::slice::from_ref(&cap), Perspective::Buyer);
        assert_eq!(buyer.rationale_code, "low_liability_cap");
        assert_eq!(buyer.risk_level, RiskLevel::Medium);

        let receiving = engine.score_clause(&clause, &[cap], Perspective::Receiving);
        assert_eq!(receiving.rationale_code, RATIONALE_NO_RULE_MATCHED);
    }

    #[test]
    fn test_short_notice_period() {
        let engine = engine();
        let clause = clause(
            ClauseType::Termination,
            "Either party may end this Agreement upon 45 days written notice.",
        );
        let notice = Entity::new(EntityKind::Duration, "45 days", "1").with_normalized("P45D");

        // vendor minimum is 60 days
        let vendor = engine.score_clause(&clause, std::slice::from_ref(&notice), Perspective::Vendor);
        assert_eq!(vendor.rationale_code, "short_notice_period");

        let buyer = engine.score_clause(&clause, &[notice], Perspective::Buyer);
        assert_eq!(buyer.rationale_code, RATIONALE_NO_RULE_MATCHED);
    }

    #[test]
    fn test_damages_exclusion_is_not_flagged() {
        let engine = engine();
        let excluded = clause(
            ClauseType::Liability,
            "In no event shall either party be liable for consequential damages.",
        );
        assert_eq!(
            engine
                .score_clause(&excluded, &[], Perspective::Buyer)
                .rationale_code,
            RATIONALE_NO_RULE_MATCHED
        );

        let exposed = clause(
            ClauseType::Liability,
            "Vendor is responsible for lost profits arising from any delay.",
        );
        assert_eq!(
            engine
                .score_clause(&exposed, &[], Perspective::Buyer)
                .rationale_code,
            "consequential_damages_exposure"
        );
    }

    #[test]
    fn test_confidentiality_sunset() {
        let engine = engine();
        let open_ended = clause(
            ClauseType::Confidentiality,
            "Recipient shall keep the Discloser's information confidential.",
        );
        let bounded = clause(
            ClauseType::Confidentiality,
            "Recipient shall keep the Discloser's information confidential for 3 years.",
        );

        assert_eq!(
            engine
                .score_clause(&open_ended, &[], Perspective::Receiving)
                .rationale_code,
            "no_confidentiality_sunset"
        );
        assert_eq!(
            engine
                .score_clause(&bounded, &[], Perspective::Receiving)
                .rationale_code,
            RATIONALE_NO_RULE_MATCHED
        );
        assert_eq!(
            engine
                .score_clause(&open_ended, &[], Perspective::Disclosing)
                .risk_level,
            RiskLevel::Low
        );
    }

    #[test]
    fn test_custom_rules_only() {
        let rule = Rule::new(
            "X001",
            "Exclusivity",
            "exclusivity",
            RiskLevel::High,
            Predicate::any_pattern(&[r"\bexclusive\s+supplier\b"]).unwrap(),
        )
        .scoped(&[ClauseType::General]);
        let engine = RiskEngine::with_rules(vec![rule], &RiskConfig::default());

        let analysis = engine.score_clause(
            &clause(ClauseType::General, "Vendor is the exclusive supplier."),
            &[],
            Perspective::Buyer,
        );
        assert_eq!(analysis.rationale_code, "exclusivity");
        assert_eq!(engine.guidance(&analysis).unwrap().rule_name, "Exclusivity");
        assert!(engine
            .guidance(&ClauseAnalysis::no_rule_matched("1"))
            .is_none());
    }

    #[test]
    fn test_aggregate_and_score() {
        let config = RiskConfig::default();
        let high = ClauseAnalysis::matched("1", RiskLevel::High, "a", "A");
        let medium = ClauseAnalysis::matched("2", RiskLevel::Medium, "b", "B");
        let low = ClauseAnalysis::no_rule_matched("3");

        assert_eq!(aggregate_risk(&[]), RiskLevel::Low);
        assert_eq!(
            aggregate_risk(&[low.clone(), medium.clone()]),
            RiskLevel::Medium
        );

        let score = ContractScore::compute(&[high.clone(), medium.clone(), low.clone()], &config);
        assert_eq!(score, ContractScore { score: 35, level: RiskLevel::Low });

        let score = ContractScore::compute(&[high.clone(), high.clone(), low], &config);
        assert_eq!(score, ContractScore { score: 50, level: RiskLevel::Medium });

        let many: Vec<ClauseAnalysis> = std::iter::repeat(high).take(6).collect();
        let score = ContractScore::compute(&many, &config);
        assert_eq!(score, ContractScore { score: 100, level: RiskLevel::High });
    }

    #[test]
    fn test_assess() {
        let engine = engine();
        let analysis = engine.assess(vec![
            ClauseAnalysis::matched("1", RiskLevel::Medium, "b", "B"),
            ClauseAnalysis::no_rule_matched("2"),
        ]);
        assert_eq!(analysis.overall_risk_level, RiskLevel::Medium);
        assert_eq!(analysis.risk_score, 10);
        assert_eq!(analysis.score_level, RiskLevel::Low);
        assert_eq!(analysis.clause_analyses.len(), 2);
    }
}
