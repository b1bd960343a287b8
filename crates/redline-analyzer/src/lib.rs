//! Redline Analyzer - Contract analysis pipeline
//!
//! Composes the stages in strict order:
//! ingestion, segmentation, classification and entity extraction,
//! risk scoring, explanation, and report assembly.
//!
//! Per-clause work runs as tokio tasks bounded by a shared semaphore and is
//! joined in clause order before the next stage starts. Only a parse failure
//! ends a request early; every other fault degrades a single clause.
//!
//! Author: hephaex@gmail.com

pub mod report;
pub mod stage;

pub use report::{
    assemble_report, compute_statistics, render_redline_document, render_text_report,
    ReportParts,
};
pub use stage::{PipelineStage, StageTracker};

use std::sync::Arc;

use futures::future::join_all;
use redline_core::{
    AppConfig, Clause, ClauseAnalysis, ClauseScoringError, Classification, ContractReport, Entity,
    ExplanationSource, Perspective, RedlineError, Result, RiskyClauseExplanation,
};
use redline_explain::{ExplanationRequest, FallbackExplainer, TemplateExplainer};
use redline_extractor::{ClauseClassifier, EntityExtractor, RuleBasedNer};
use redline_ocr::OcrManager;
use redline_parser::{ParserRegistry, Segmenter};
use redline_risk::RiskEngine;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// ============================================================================
// Analyzer
// ============================================================================

/// End-to-end contract analyzer
///
/// Engines are shared read-only between clause tasks; the explanation cache
/// inside the explainer is the only state that changes while analyzing.
pub struct ContractAnalyzer {
    config: Arc<AppConfig>,
    registry: Arc<ParserRegistry>,
    segmenter: Segmenter,
    classifier: Arc<ClauseClassifier>,
    ner: Arc<RuleBasedNer>,
    engine: Arc<RiskEngine>,
    explainer: Arc<FallbackExplainer>,
    semaphore: Arc<Semaphore>,
}

impl ContractAnalyzer {
    /// Analyzer with built-in rules, default parsers and the configured explainer
    pub fn new(config: Arc<AppConfig>) -> Result<Self> {
        let engine = RiskEngine::new(&config.risk)?;
        let explainer = FallbackExplainer::from_config(&config);
        let registry = ParserRegistry::with_defaults(Some(Arc::new(OcrManager::new())));

        Ok(Self {
            registry: Arc::new(registry),
            segmenter: Segmenter::new(config.segmentation.clone()),
            classifier: Arc::new(ClauseClassifier::new()),
            ner: Arc::new(RuleBasedNer::new()),
            engine: Arc::new(engine),
            explainer: Arc::new(explainer),
            semaphore: Arc::new(Semaphore::new(config.pipeline.max_concurrency.max(1))),
            config,
        })
    }

    /// Replace the risk engine (custom rules or a playbook)
    pub fn with_engine(mut self, engine: RiskEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Replace the explainer
    pub fn with_explainer(mut self, explainer: FallbackExplainer) -> Self {
        self.explainer = Arc::new(explainer);
        self
    }

    /// Replace the parser registry
    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    /// Analyze a document
    pub async fn analyze(
        &self,
        bytes: &[u8],
        filename: &str,
        perspective: Perspective,
    ) -> Result<ContractReport> {
        self.analyze_with_cancel(bytes, filename, perspective, CancellationToken::new())
            .await
    }

    /// Analyze a document; cancelling abandons LLM calls in favour of templates
    pub async fn analyze_with_cancel(
        &self,
        bytes: &[u8],
        filename: &str,
        perspective: Perspective,
        cancel: CancellationToken,
    ) -> Result<ContractReport> {
        let mut tracker = StageTracker::new(filename);

        let pages = match self.ingest(bytes, filename).await {
            Ok(pages) => pages,
            Err(e) => return Err(tracker.fail(e)),
        };

        self.run(tracker, pages, filename, perspective, cancel).await
    }

    /// Analyze text that was already extracted, one entry per page
    pub async fn analyze_pages(
        &self,
        pages: Vec<String>,
        filename: &str,
        perspective: Perspective,
    ) -> Result<ContractReport> {
        let tracker = StageTracker::new(filename);
        self.run(tracker, pages, filename, perspective, CancellationToken::new())
            .await
    }

    /// Stage 1: raw page text, off the async runtime
    async fn ingest(&self, bytes: &[u8], filename: &str) -> Result<Vec<String>> {
        let registry = Arc::clone(&self.registry);
        let bytes = bytes.to_vec();
        let name = filename.to_string();

        let document = tokio::task::spawn_blocking(move || registry.parse_bytes(&bytes, &name))
            .await
            .map_err(|e| RedlineError::parse_failed(format!("ingestion task failed: {e}")))??;

        debug!(
            file = filename,
            file_type = %document.file_type,
            pages = document.pages.len(),
            ocr = document.metadata.ocr_applied,
            "Ingested document"
        );
        Ok(document.pages)
    }

    async fn run(
        &self,
        mut tracker: StageTracker,
        pages: Vec<String>,
        filename: &str,
        perspective: Perspective,
        cancel: CancellationToken,
    ) -> Result<ContractReport> {
        // 2. Segmentation
        let segments = match self.segmenter.segment_pages(pages.as_slice()) {
            Ok(segments) => segments,
            Err(e) => return Err(tracker.fail(e.into())),
        };
        tracker.advance(PipelineStage::Segmented)?;
        debug!(clauses = segments.len(), "Segmentation complete");

        // 3-4. Classification and entity extraction
        let classified = join_all(segments.into_iter().map(|segment| {
            let classifier = Arc::clone(&self.classifier);
            let ner = Arc::clone(&self.ner);
            let semaphore = Arc::clone(&self.semaphore);
            let fallback = segment.clone();

            async move {
                let task = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let classification = classifier.classify_segment(&segment);
                    let clause = segment.into_clause(classification);
                    let entities = ner.extract(&clause);
                    (clause, entities)
                });

                match task.await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(clause_id = %fallback.id, error = %e, "Classification task failed");
                        (fallback.into_clause(Classification::general()), Vec::new())
                    }
                }
            }
        }))
        .await;
        tracker.advance(PipelineStage::Classified)?;

        let (clauses, entities): (Vec<Clause>, Vec<Vec<Entity>>) = classified.into_iter().unzip();
        debug!(
            entities = entities.iter().map(Vec::len).sum::<usize>(),
            "Entity extraction complete"
        );

        // 5. Risk scoring
        let analyses = self.score(&clauses, &entities, perspective).await;
        let risk_analysis = self.engine.assess(analyses);
        tracker.advance(PipelineStage::Scored)?;
        info!(
            overall = %risk_analysis.overall_risk_level,
            score = risk_analysis.risk_score,
            "Risk scoring complete"
        );

        // 6. Explanations
        let issues = self
            .explain(&clauses, &risk_analysis.clause_analyses, perspective, &cancel)
            .await;
        let summary_request = report::summary_request(&clauses, &risk_analysis, perspective);
        let (executive_summary, summary_source) = self
            .explainer
            .summarize_with_cancel(&summary_request, &cancel)
            .await;
        tracker.advance(PipelineStage::Explained)?;
        debug!(
            issues = issues.len(),
            llm = issues.iter().filter(|i| i.source == ExplanationSource::Llm).count(),
            "Explanations complete"
        );

        // 7. Assembly
        let report = assemble_report(ReportParts {
            filename: filename.to_string(),
            perspective,
            clauses,
            entities: entities.into_iter().flatten().collect(),
            risk_analysis,
            issues,
            executive_summary,
            summary_source,
            explanation_threshold: self.config.risk.explanation_threshold,
        });
        tracker.advance(PipelineStage::Assembled)?;

        info!(
            report_id = %report.report_id,
            clauses = report.explanations.statistics.total_clauses,
            issues = report.explanations.statistics.total_issues,
            "Analysis complete"
        );
        Ok(report)
    }

    /// One verdict per clause, in clause order
    async fn score(
        &self,
        clauses: &[Clause],
        entities: &[Vec<Entity>],
        perspective: Perspective,
    ) -> Vec<ClauseAnalysis> {
        join_all(clauses.iter().zip(entities).map(|(clause, clause_entities)| {
            let engine = Arc::clone(&self.engine);
            let semaphore = Arc::clone(&self.semaphore);
            let clause = clause.clone();
            let clause_entities = clause_entities.clone();
            let clause_id = clause.id.clone();

            async move {
                let task = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    engine.score_clause(&clause, &clause_entities, perspective)
                });

                match task.await {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        let fault = ClauseScoringError::Panicked {
                            clause_id: clause_id.clone(),
                        };
                        warn!(error = %e, fault = %fault, "Clause scoring task failed");
                        ClauseAnalysis::engine_error(clause_id)
                    }
                }
            }
        }))
        .await
    }

    /// One explanation per clause at or above the explanation threshold
    async fn explain(
        &self,
        clauses: &[Clause],
        analyses: &[ClauseAnalysis],
        perspective: Perspective,
        cancel: &CancellationToken,
    ) -> Vec<RiskyClauseExplanation> {
        let threshold = self.config.risk.explanation_threshold;

        let requests: Vec<ExplanationRequest> = clauses
            .iter()
            .zip(analyses)
            .filter(|(_, analysis)| analysis.is_flagged(threshold))
            .map(|(clause, analysis)| ExplanationRequest {
                clause: clause.clone(),
                analysis: analysis.clone(),
                perspective,
                guidance: self.engine.guidance(analysis).cloned(),
            })
            .collect();

        join_all(requests.into_iter().map(|request| {
            let explainer = Arc::clone(&self.explainer);
            let semaphore = Arc::clone(&self.semaphore);
            let cancel = cancel.clone();
            let fallback = request.clone();

            async move {
                let task = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let (text, source) = explainer.explain_with_cancel(&request, &cancel).await;
                    RiskyClauseExplanation::new(&request.clause, &request.analysis, text, source)
                });

                match task.await {
                    Ok(explanation) => explanation,
                    Err(e) => {
                        warn!(clause_id = %fallback.clause.id, error = %e, "Explanation task failed");
                        let text = TemplateExplainer::new().render(&fallback);
                        RiskyClauseExplanation::new(
                            &fallback.clause,
                            &fallback.analysis,
                            text,
                            ExplanationSource::Fallback,
                        )
                    }
                }
            }
        }))
        .await
    }
}
