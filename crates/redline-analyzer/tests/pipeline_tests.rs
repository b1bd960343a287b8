//! End-to-end tests for the analysis pipeline
//!
//! LLM behaviour is driven by a scripted `LlmClient` so success, failure,
//! timeout and cancellation are all exercised without a network.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use redline_analyzer::{render_redline_document, ContractAnalyzer};
use redline_core::{
    AppConfig, ClauseType, ContractReport, ExplanationSource, LlmClient, Perspective,
    RedlineError, RiskLevel,
};
use redline_explain::{ExplanationCache, FallbackExplainer, LlmExplainer};
use redline_risk::RiskEngine;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

const CONTRACT: &str = "SERVICES AGREEMENT

This Services Agreement is made between Acme Corp. and Beta LLC on January 5, 2024.

1. Indemnification. Receiving Party shall indemnify Disclosing Party without limitation as to amount or duration.

2. Termination. The Company may terminate this Agreement at any time.

3. Notices. All notices shall be given in writing by email.
";

const LLM_EXPLANATION: &str = r#"{
    "summary": "This clause carries a risk the reader should address.",
    "why_risky": "The detected terms shift exposure onto the reader.",
    "recommendation": "Negotiate narrower terms before signing.",
    "redline_suggestion": "Each party's liability is limited to the fees paid."
}"#;

// ============================================================================
// Scripted LLM client
// ============================================================================

#[derive(Clone, Copy)]
enum Behaviour {
    Answer,
    Fail,
    Hang,
}

struct ScriptedLlm {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> redline_core::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Answer if prompt.contains("executive summary") => {
                Ok("The contract carries one uncapped indemnity that needs negotiation.".to_string())
            }
            Behaviour::Answer => Ok(LLM_EXPLANATION.to_string()),
            Behaviour::Fail => Err(RedlineError::LlmError("provider unavailable".to_string())),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(LLM_EXPLANATION.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn template_analyzer() -> ContractAnalyzer {
    ContractAnalyzer::new(Arc::new(AppConfig::default())).unwrap()
}

fn llm_analyzer(llm: Arc<ScriptedLlm>, timeout: Duration) -> ContractAnalyzer {
    let explainer = LlmExplainer::new(llm, ExplanationCache::default());
    template_analyzer().with_explainer(FallbackExplainer::new(Arc::new(explainer), timeout))
}

fn assert_coverage(report: &ContractReport) {
    let threshold = AppConfig::default().risk.explanation_threshold;
    assert_eq!(
        report.clauses.len(),
        report.risk_analysis.clause_analyses.len()
    );

    for clause in &report.clauses {
        let matching = report
            .risk_analysis
            .clause_analyses
            .iter()
            .filter(|a| a.clause_id == clause.id)
            .count();
        assert_eq!(matching, 1, "clause {} must have one analysis", clause.id);

        let analysis = report.analysis_for(&clause.id).unwrap();
        let explanations = report
            .explanations
            .issues
            .iter()
            .filter(|e| e.clause_id == clause.id)
            .count();
        if analysis.is_flagged(threshold) {
            assert_eq!(explanations, 1, "clause {} must be explained", clause.id);
            assert!(report.explanation_for(&clause.id).unwrap().is_complete());
        } else {
            assert_eq!(explanations, 0);
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_analyze_text_contract() {
    let report = template_analyzer()
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving)
        .await
        .unwrap();

    let ids: Vec<&str> = report.clauses.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2", "3"]);
    assert_eq!(report.clauses[1].primary_type, ClauseType::Indemnification);
    assert_eq!(report.clauses[2].primary_type, ClauseType::Termination);

    let indemnity = report.analysis_for("1").unwrap();
    assert_eq!(indemnity.risk_level, RiskLevel::High);
    assert_eq!(indemnity.rationale_code, "uncapped_liability");
    assert!(indemnity.matched_rule_ids.contains("IND001"));

    let termination = report.analysis_for("2").unwrap();
    assert_eq!(termination.risk_level, RiskLevel::Medium);
    assert_eq!(termination.rationale_code, "at_will_termination");

    assert_eq!(report.analysis_for("3").unwrap().rationale_code, "no_rule_matched");

    assert_eq!(report.risk_analysis.overall_risk_level, RiskLevel::High);
    assert_eq!(report.risk_analysis.risk_score, 35);
    assert_eq!(report.risk_analysis.score_level, RiskLevel::Low);

    let stats = &report.explanations.statistics;
    assert_eq!(stats.total_clauses, 4);
    assert_eq!((stats.high_risk, stats.medium_risk, stats.low_risk), (1, 1, 2));
    assert_eq!(stats.total_issues, 2);

    assert!(report
        .explanations
        .issues
        .iter()
        .all(|i| i.source == ExplanationSource::Fallback));
    assert_eq!(report.explanations.summary_source, ExplanationSource::Fallback);
    assert!(!report.explanations.overall_recommendations.is_empty());
    assert!(report.entities_for("0").count() > 0);
    assert_coverage(&report);
}

#[tokio::test]
async fn test_perspective_changes_levels_only() {
    let analyzer = template_analyzer();
    let employee = analyzer
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Employee)
        .await
        .unwrap();
    let employer = analyzer
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Employer)
        .await
        .unwrap();

    assert_eq!(employee.clauses, employer.clauses);
    assert_eq!(employee.entities, employer.entities);
    assert_eq!(employee.analysis_for("2").unwrap().risk_level, RiskLevel::High);
    assert_eq!(employer.analysis_for("2").unwrap().risk_level, RiskLevel::Low);
    assert!(employer.explanation_for("2").is_none());
    assert_coverage(&employee);
    assert_coverage(&employer);
}

#[tokio::test]
async fn test_analyze_pages_matches_bytes() {
    let analyzer = template_analyzer();
    let from_pages = assert_ok!(
        analyzer
            .analyze_pages(vec![CONTRACT.to_string()], "services.txt", Perspective::Receiving)
            .await
    );
    let from_bytes = assert_ok!(
        analyzer
            .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving)
            .await
    );

    assert_eq!(from_pages.clauses, from_bytes.clauses);
    assert_eq!(
        from_pages.risk_analysis.clause_analyses,
        from_bytes.risk_analysis.clause_analyses
    );
    assert_ne!(from_pages.report_id, from_bytes.report_id);
}

#[tokio::test]
async fn test_empty_documents_fail_to_parse() {
    let analyzer = template_analyzer();

    for bytes in [&b""[..], &b"   \n\t \n"[..], &b"Too short."[..]] {
        let err = assert_err!(
            analyzer
                .analyze(bytes, "blank.txt", Perspective::Receiving)
                .await
        );
        assert!(err.is_parse_failure(), "unexpected error: {err}");
        assert!(err
            .to_string()
            .ends_with("Ensure the file is not corrupted and contains readable text."));
    }

    let err = analyzer
        .analyze_pages(Vec::new(), "none.txt", Perspective::Receiving)
        .await
        .unwrap_err();
    assert!(err.is_parse_failure());
}

#[tokio::test]
async fn test_binary_upload_fails_to_parse() {
    let err = template_analyzer()
        .analyze(&[0xC3, 0x28, 0xA0, 0xFF], "upload.bin", Perspective::Buyer)
        .await
        .unwrap_err();
    assert!(err.is_parse_failure());
}

#[tokio::test]
async fn test_playbook_rules_flag_clauses() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"name": "Notices", "rules": [{{
            "ruleId": "PB100", "name": "Email Notice", "rationaleCode": "email_notice",
            "clauseTypes": ["general"], "patterns": ["\\bby\\s+email\\b"], "riskLevel": "MEDIUM",
            "description": "Notices by email only", "whyRisky": "Email notices are easy to miss.",
            "recommendation": "Require delivery by courier as well.",
            "redlineSuggestion": "Notices shall be delivered by courier with a copy by email."
        }}]}}"#
    )
    .unwrap();

    let config = AppConfig::default();
    let engine = RiskEngine::with_playbook(&config.risk, file.path()).unwrap();
    let report = template_analyzer()
        .with_engine(engine)
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving)
        .await
        .unwrap();

    let notices = report.analysis_for("3").unwrap();
    assert_eq!(notices.rationale_code, "email_notice");
    assert_eq!(notices.risk_level, RiskLevel::Medium);

    let explanation = report.explanation_for("3").unwrap();
    assert_eq!(
        explanation.redline_suggestion,
        "Notices shall be delivered by courier with a copy by email."
    );
    assert_coverage(&report);
}

// ============================================================================
// Explanations
// ============================================================================

#[tokio::test]
async fn test_llm_explanations_used_when_available() {
    let llm = ScriptedLlm::new(Behaviour::Answer);
    let report = llm_analyzer(Arc::clone(&llm), Duration::from_secs(5))
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving)
        .await
        .unwrap();

    assert_eq!(report.explanations.issues.len(), 2);
    assert!(report
        .explanations
        .issues
        .iter()
        .all(|i| i.source == ExplanationSource::Llm));
    assert_eq!(report.explanations.summary_source, ExplanationSource::Llm);
    assert!(report
        .explanations
        .executive_summary
        .starts_with("The contract carries one uncapped indemnity"));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    assert_coverage(&report);
}

#[tokio::test]
async fn test_provider_failure_falls_back() {
    let llm = ScriptedLlm::new(Behaviour::Fail);
    let report = llm_analyzer(llm, Duration::from_secs(5))
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving)
        .await
        .unwrap();

    assert_eq!(report.explanations.issues.len(), 2);
    assert!(report
        .explanations
        .issues
        .iter()
        .all(|i| i.source == ExplanationSource::Fallback));
    assert_eq!(report.explanations.summary_source, ExplanationSource::Fallback);
    assert_coverage(&report);
}

#[tokio::test]
async fn test_timeout_falls_back() {
    let llm = ScriptedLlm::new(Behaviour::Hang);
    let analyzer = llm_analyzer(llm, Duration::from_millis(50));

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        analyzer.analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving),
    )
    .await
    .expect("analysis should not wait for the hanging provider")
    .unwrap();

    assert!(report
        .explanations
        .issues
        .iter()
        .all(|i| i.source == ExplanationSource::Fallback && i.is_complete()));
    assert_coverage(&report);
}

#[tokio::test]
async fn test_cancellation_falls_back() {
    let llm = ScriptedLlm::new(Behaviour::Hang);
    let analyzer = llm_analyzer(llm, Duration::from_secs(60));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        analyzer.analyze_with_cancel(
            CONTRACT.as_bytes(),
            "services.txt",
            Perspective::Receiving,
            cancel,
        ),
    )
    .await
    .expect("cancellation should release the pipeline")
    .unwrap();

    assert_eq!(report.explanations.issues.len(), 2);
    assert!(report
        .explanations
        .issues
        .iter()
        .all(|i| i.source == ExplanationSource::Fallback));
    assert_eq!(report.explanations.summary_source, ExplanationSource::Fallback);
    assert_coverage(&report);
}

#[tokio::test]
async fn test_precancelled_request_never_calls_llm() {
    let llm = ScriptedLlm::new(Behaviour::Answer);
    let analyzer = llm_analyzer(Arc::clone(&llm), Duration::from_secs(5));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = analyzer
        .analyze_with_cancel(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving, cancel)
        .await
        .unwrap();

    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.explanations.issues.len(), 2);
    assert_coverage(&report);
}

#[tokio::test]
async fn test_disabling_llm_keeps_every_explanation() {
    let with_llm = llm_analyzer(ScriptedLlm::new(Behaviour::Answer), Duration::from_secs(5))
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Employee)
        .await
        .unwrap();
    let without_llm = template_analyzer()
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Employee)
        .await
        .unwrap();

    assert_eq!(
        with_llm.explanations.issues.len(),
        without_llm.explanations.issues.len()
    );
    let ids = |r: &ContractReport| -> Vec<String> {
        r.explanations.issues.iter().map(|i| i.clause_id.clone()).collect()
    };
    assert_eq!(ids(&with_llm), ids(&without_llm));
}

// ============================================================================
// Output
// ============================================================================

#[tokio::test]
async fn test_report_json_shape() {
    let report = template_analyzer()
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving)
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["clauses"][1]["primary_type"], "indemnification");
    assert_eq!(json["risk_analysis"]["clause_analyses"][1]["risk_level"], "HIGH");
    assert_eq!(
        json["risk_analysis"]["clause_analyses"][1]["matched_rule_ids"][0],
        "IND001"
    );
    assert_eq!(json["explanations"]["statistics"]["total_issues"], 2);
    assert_eq!(json["explanations"]["issues"][0]["source"], "fallback");
    assert!(json["explanations"]["executive_summary"].is_string());
    assert!(json["explanations"]["overall_recommendations"].is_array());
    assert_eq!(json["perspective"], "receiving");
}

#[tokio::test]
async fn test_redline_document_lists_issues() {
    let report = template_analyzer()
        .analyze(CONTRACT.as_bytes(), "services.txt", Perspective::Receiving)
        .await
        .unwrap();
    let document = render_redline_document(&report);

    assert!(document.contains("[1] CLAUSE 1: Indemnification"));
    assert!(document.contains("Rule: IND001 (uncapped_liability)"));
    assert!(document.contains("[2] CLAUSE 2: Termination"));
    assert!(!document.contains("CLAUSE 3"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_every_clause_gets_one_verdict(
        bodies in prop::collection::vec("[a-z]{3,9}( [a-z]{3,9}){4,12}", 2..6),
    ) {
        let text = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| format!("{}. Heading {}\nThe party shall {}.", i + 1, i + 1, body))
            .collect::<Vec<_>>()
            .join("\n\n");

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let report = runtime
            .block_on(template_analyzer().analyze_pages(vec![text], "generated.txt", Perspective::Vendor))
            .unwrap();

        prop_assert_eq!(report.clauses.len(), bodies.len());
        prop_assert_eq!(report.clauses.len(), report.risk_analysis.clause_analyses.len());
        for (clause, analysis) in report.clauses.iter().zip(&report.risk_analysis.clause_analyses) {
            prop_assert_eq!(&clause.id, &analysis.clause_id);
        }
        for issue in &report.explanations.issues {
            prop_assert!(issue.is_complete());
        }
    }
}
