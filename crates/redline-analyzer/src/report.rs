//! Report assembly and rendering
//!
//! Turns the outputs of every stage into the immutable [`ContractReport`]
//! and renders it for people: a short text report and the printable
//! redline document.
//!
//! Author: hephaex@gmail.com

use std::fmt::Write;

use chrono::Utc;
use redline_core::{
    Clause, ClauseAnalysis, ContractReport, Entity, ExplanationReport, ExplanationSource,
    Perspective, ReportStatistics, RiskAnalysis, RiskLevel, RiskyClauseExplanation,
};
use redline_explain::{overall_recommendations, SummaryRequest};
use uuid::Uuid;

const RULE: &str =
    "================================================================================";

// ============================================================================
// Statistics
// ============================================================================

/// Contract-level counts over clauses, verdicts and entities
pub fn compute_statistics(
    clauses: &[Clause],
    entities: &[Entity],
    analyses: &[ClauseAnalysis],
    explanation_threshold: RiskLevel,
) -> ReportStatistics {
    let mut stats = ReportStatistics {
        total_clauses: clauses.len(),
        ..Default::default()
    };

    for analysis in analyses {
        match analysis.risk_level {
            RiskLevel::High => stats.high_risk += 1,
            RiskLevel::Medium => stats.medium_risk += 1,
            RiskLevel::Low => stats.low_risk += 1,
        }
        if analysis.is_flagged(explanation_threshold) {
            stats.total_issues += 1;
        }
    }

    for clause in clauses {
        *stats.by_clause_type.entry(clause.primary_type).or_default() += 1;
    }
    for entity in entities {
        *stats.by_entity_kind.entry(entity.kind).or_default() += 1;
    }

    stats
}

fn display_title(clause: &Clause) -> String {
    if clause.title.trim().is_empty() {
        format!("Clause {}", clause.id)
    } else {
        clause.title.clone()
    }
}

/// Input for the executive summary
pub fn summary_request(
    clauses: &[Clause],
    risk: &RiskAnalysis,
    perspective: Perspective,
) -> SummaryRequest {
    let titles_at = |level: RiskLevel| -> Vec<String> {
        clauses
            .iter()
            .zip(&risk.clause_analyses)
            .filter(|(_, analysis)| analysis.risk_level == level)
            .map(|(clause, _)| display_title(clause))
            .collect()
    };

    let high_titles = titles_at(RiskLevel::High);
    let medium_titles = titles_at(RiskLevel::Medium);

    SummaryRequest {
        overall_risk_level: risk.overall_risk_level,
        risk_score: risk.risk_score,
        perspective,
        total_clauses: clauses.len(),
        high_risk: high_titles.len(),
        medium_risk: medium_titles.len(),
        high_titles,
        medium_titles,
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Outputs of the pipeline stages for one document
#[derive(Debug)]
pub struct ReportParts {
    pub filename: String,
    pub perspective: Perspective,
    pub clauses: Vec<Clause>,
    pub entities: Vec<Entity>,
    pub risk_analysis: RiskAnalysis,
    pub issues: Vec<RiskyClauseExplanation>,
    pub executive_summary: String,
    pub summary_source: ExplanationSource,
    pub explanation_threshold: RiskLevel,
}

/// Build the final report
pub fn assemble_report(parts: ReportParts) -> ContractReport {
    let statistics = compute_statistics(
        &parts.clauses,
        &parts.entities,
        &parts.risk_analysis.clause_analyses,
        parts.explanation_threshold,
    );

    let overall_recommendations = overall_recommendations(
        statistics.high_risk,
        statistics.medium_risk,
        parts.risk_analysis.overall_risk_level,
        parts.perspective,
    );

    ContractReport {
        report_id: Uuid::new_v4(),
        filename: parts.filename,
        perspective: parts.perspective,
        generated_at: Utc::now(),
        clauses: parts.clauses,
        entities: parts.entities,
        risk_analysis: parts.risk_analysis,
        explanations: ExplanationReport {
            executive_summary: parts.executive_summary,
            summary_source: parts.summary_source,
            statistics,
            issues: parts.issues,
            overall_recommendations,
        },
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Printable document listing every redline suggestion
pub fn render_redline_document(report: &ContractReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "CONTRACT REDLINE SUGGESTIONS");
    let _ = writeln!(out, "Document: {}", report.filename);
    let _ = writeln!(
        out,
        "Perspective: {} | Overall risk: {}",
        report.perspective, report.risk_analysis.overall_risk_level
    );
    let _ = writeln!(out, "{RULE}");

    for (i, issue) in report.explanations.issues.iter().enumerate() {
        let title = if issue.clause_title.trim().is_empty() {
            format!("Clause {}", issue.clause_id)
        } else {
            issue.clause_title.clone()
        };
        let rule = report
            .analysis_for(&issue.clause_id)
            .and_then(|a| a.matched_rule_ids.iter().next())
            .map(|id| format!("{id} ({})", issue.rationale_code))
            .unwrap_or_else(|| issue.rationale_code.clone());

        let _ = writeln!(out);
        let _ = writeln!(out, "[{}] CLAUSE {}: {}", i + 1, issue.clause_id, title);
        let _ = writeln!(out, "    Rule: {rule}");
        let _ = writeln!(out, "    Type: {}", issue.clause_type.label().to_uppercase());
        let _ = writeln!(out, "    Risk: {}", issue.risk_level);
        let _ = writeln!(out);
        let _ = writeln!(out, "    SUGGESTED CHANGE:");
        let _ = writeln!(out, "    {}", issue.recommendation);
        let _ = writeln!(out, "    {}", issue.redline_suggestion);
    }

    if report.explanations.issues.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No redline suggestions. The contract appears acceptable.");
    }

    out
}

/// Human-readable analysis report
pub fn render_text_report(report: &ContractReport) -> String {
    let stats = &report.explanations.statistics;
    let risk = &report.risk_analysis;

    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "CONTRACT RISK ANALYSIS: {}", report.filename);
    let _ = writeln!(out, "Perspective: {}", report.perspective);
    let _ = writeln!(
        out,
        "Overall risk: {} | Score: {}/100 ({})",
        risk.overall_risk_level, risk.risk_score, risk.score_level
    );
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "\nEXECUTIVE SUMMARY ({})", report.explanations.summary_source);
    let _ = writeln!(out, "{}", report.explanations.executive_summary);

    let _ = writeln!(out, "\nSTATISTICS");
    let _ = writeln!(out, "  Clauses: {}", stats.total_clauses);
    let _ = writeln!(
        out,
        "  High: {} | Medium: {} | Low: {}",
        stats.high_risk, stats.medium_risk, stats.low_risk
    );
    let _ = writeln!(out, "  Issues: {}", stats.total_issues);

    let _ = writeln!(out, "\nCLAUSES");
    for clause in &report.clauses {
        let Some(analysis) = report.analysis_for(&clause.id) else {
            continue;
        };
        let _ = writeln!(
            out,
            "  {:<6} {:<7} {:<22} {} [{}]",
            clause.id,
            analysis.risk_level.as_str(),
            clause.primary_type.label(),
            display_title(clause),
            analysis.rationale_code
        );
    }

    if !report.explanations.issues.is_empty() {
        let _ = writeln!(out, "\nISSUES");
        for issue in &report.explanations.issues {
            let _ = writeln!(
                out,
                "\n  [{}] Clause {} ({}, {})",
                issue.risk_level, issue.clause_id, issue.clause_type.label(), issue.source
            );
            let _ = writeln!(out, "  Summary: {}", issue.summary);
            let _ = writeln!(out, "  Why risky: {}", issue.why_risky);
            let _ = writeln!(out, "  Recommendation: {}", issue.recommendation);
            let _ = writeln!(out, "  Redline: {}", issue.redline_suggestion);
        }
    }

    let _ = writeln!(out, "\nRECOMMENDATIONS");
    for recommendation in &report.explanations.overall_recommendations {
        let _ = writeln!(out, "  - {recommendation}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::{ClauseType, EntityKind, ExplanationText};

    fn clauses() -> Vec<Clause> {
        vec![
            Clause::new("1", "Indemnity", "shall indemnify", 1, ClauseType::Indemnification),
            Clause::new("2", "", "terminate at any time", 2, ClauseType::Termination),
            Clause::new("3", "Notices", "notices in writing", 3, ClauseType::General),
        ]
    }

    fn risk() -> RiskAnalysis {
        RiskAnalysis {
            overall_risk_level: RiskLevel::High,
            risk_score: 35,
            score_level: RiskLevel::Low,
            clause_analyses: vec![
                ClauseAnalysis::matched("1", RiskLevel::High, "uncapped_liability", "IND001"),
                ClauseAnalysis::matched("2", RiskLevel::Medium, "immediate_termination", "TERM002"),
                ClauseAnalysis::no_rule_matched("3"),
            ],
        }
    }

    fn report() -> ContractReport {
        let clauses = clauses();
        let risk = risk();
        let issue = RiskyClauseExplanation::new(
            &clauses[0],
            &risk.clause_analyses[0],
            ExplanationText {
                summary: "Open-ended indemnity.".to_string(),
                why_risky: "No cap.".to_string(),
                recommendation: "Cap it.".to_string(),
                redline_suggestion: "Liability is capped at fees paid.".to_string(),
            },
            ExplanationSource::Fallback,
        );

        assemble_report(ReportParts {
            filename: "nda.txt".to_string(),
            perspective: Perspective::Receiving,
            clauses,
            entities: vec![Entity::new(EntityKind::Party, "Receiving Party", "1")],
            risk_analysis: risk,
            issues: vec![issue],
            executive_summary: "Summary.".to_string(),
            summary_source: ExplanationSource::Fallback,
            explanation_threshold: RiskLevel::High,
        })
    }

    #[test]
    fn test_statistics() {
        let stats = compute_statistics(
            &clauses(),
            &[
                Entity::new(EntityKind::Party, "Vendor", "1"),
                Entity::new(EntityKind::Party, "Client", "2"),
                Entity::new(EntityKind::Duration, "30 days", "2"),
            ],
            &risk().clause_analyses,
            RiskLevel::Medium,
        );

        assert_eq!(stats.total_clauses, 3);
        assert_eq!((stats.high_risk, stats.medium_risk, stats.low_risk), (1, 1, 1));
        assert_eq!(stats.total_issues, 2);
        assert_eq!(stats.by_clause_type.get(&ClauseType::General), Some(&1));
        assert_eq!(stats.by_entity_kind.get(&EntityKind::Party), Some(&2));
    }

    #[test]
    fn test_summary_request_titles() {
        let request = summary_request(&clauses(), &risk(), Perspective::Buyer);
        assert_eq!(request.high_titles, vec!["Indemnity".to_string()]);
        assert_eq!(request.medium_titles, vec!["Clause 2".to_string()]);
        assert_eq!(request.high_risk, 1);
        assert_eq!(request.total_clauses, 3);
    }

    #[test]
    fn test_assemble_report() {
        let report = report();
        assert_eq!(report.explanations.statistics.total_issues, 1);
        assert_eq!(report.perspective, Perspective::Receiving);
        assert!(report
            .explanations
            .overall_recommendations
            .iter()
            .any(|r| r.starts_with("Strongly consider legal counsel")));
    }

    #[test]
    fn test_redline_document() {
        let doc = render_redline_document(&report());
        assert!(doc.starts_with(RULE));
        assert!(doc.contains("CONTRACT REDLINE SUGGESTIONS"));
        assert!(doc.contains("[1] CLAUSE 1: Indemnity"));
        assert!(doc.contains("Rule: IND001 (uncapped_liability)"));
        assert!(doc.contains("Type: INDEMNIFICATION"));
        assert!(doc.contains("    Liability is capped at fees paid."));
    }

    #[test]
    fn test_redline_document_without_issues() {
        let mut report = report();
        report.explanations.issues.clear();
        let doc = render_redline_document(&report);
        assert!(doc.contains("No redline suggestions. The contract appears acceptable."));
    }

    #[test]
    fn test_text_report_lists_every_clause() {
        let text = render_text_report(&report());
        assert!(text.contains("Overall risk: HIGH | Score: 35/100 (LOW)"));
        assert!(text.contains("[no_rule_matched]"));
        assert!(text.contains("Redline: Liability is capped at fees paid."));
    }
}
