//! Redline Explain - Plain-language explanations for flagged clauses
//!
//! Two explainers share the [`ClauseExplainer`] capability:
//! - [`LlmExplainer`] asks a language model for a structured JSON answer
//! - [`TemplateExplainer`] renders deterministic text from rule guidance
//!
//! [`FallbackExplainer`] composes them: the LLM path runs under a timeout and
//! the caller's cancellation token, and any failure falls back to templates.
//!
//! Author: hephaex@gmail.com

pub mod cache;
pub mod explainer;
pub mod llm;
pub mod prompt;
pub mod summary;
pub mod templates;

pub use cache::{CacheStats, ExplanationCache};
pub use explainer::{FallbackExplainer, LlmExplainer};
pub use llm::{create_llm_client, OllamaClient, OpenAiClient};
pub use summary::overall_recommendations;
pub use templates::TemplateExplainer;

use async_trait::async_trait;
use redline_core::{
    Clause, ClauseAnalysis, ExplanationSource, ExplanationText, ExplanationUnavailable,
    Perspective, RiskLevel, RuleGuidance,
};

/// Everything needed to explain one flagged clause
#[derive(Debug, Clone)]
pub struct ExplanationRequest {
    pub clause: Clause,
    pub analysis: ClauseAnalysis,
    pub perspective: Perspective,

    /// Guidance of the rule that produced the verdict
    pub guidance: Option<RuleGuidance>,
}

impl ExplanationRequest {
    /// Title used in generated text; untitled clauses are named by id
    pub fn display_title(&self) -> String {
        if self.clause.title.trim().is_empty() {
            format!("Clause {}", self.clause.id)
        } else {
            self.clause.title.clone()
        }
    }

    /// Id of the rule that produced the verdict
    pub fn rule_id(&self) -> Option<&str> {
        self.analysis.matched_rule_ids.iter().next().map(String::as_str)
    }
}

/// Contract-level input for the executive summary
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub overall_risk_level: RiskLevel,
    pub risk_score: u32,
    pub perspective: Perspective,
    pub total_clauses: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub high_titles: Vec<String>,
    pub medium_titles: Vec<String>,
}

/// Produces explanation text for flagged clauses
#[async_trait]
pub trait ClauseExplainer: Send + Sync {
    /// Four-field explanation of one clause
    async fn explain(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationText, ExplanationUnavailable>;

    /// Executive summary of the whole contract
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, ExplanationUnavailable>;

    /// Provenance recorded on text this explainer produces
    fn source(&self) -> ExplanationSource;
}
