//! LLM explainer and the fallback decorator

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use redline_core::{
    AppConfig, ExplanationSource, ExplanationText, ExplanationUnavailable, LlmClient,
};

use crate::cache::{ExplanationCache, ExplanationKey};
use crate::llm::create_llm_client;
use crate::prompt::{explanation_prompt, summary_prompt};
use crate::templates::TemplateExplainer;
use crate::{ClauseExplainer, ExplanationRequest, SummaryRequest};

/// Phrases that mark a non-answer
const GENERIC_PHRASES: &[&str] = &[
    "i cannot",
    "unable to explain",
    "no information provided",
    "insufficient data",
];

// ============================================================================
// Response parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct LlmExplanation {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    why_risky: String,
    #[serde(default)]
    recommendation: String,
    #[serde(default, alias = "example_wording")]
    redline_suggestion: String,
}

fn parse_json(raw: &str) -> Option<LlmExplanation> {
    if let Ok(parsed) = serde_json::from_str(raw.trim()) {
        return Some(parsed);
    }
    // Models often wrap the object in prose or code fences
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn reject_generic(text: &str) -> Result<(), ExplanationUnavailable> {
    let lowered = text.to_lowercase();
    match GENERIC_PHRASES.iter().find(|p| lowered.contains(*p)) {
        Some(phrase) => Err(ExplanationUnavailable::GenericResponse(phrase.to_string())),
        None => Ok(()),
    }
}

/// Validate a model answer into four complete fields
pub fn parse_explanation(raw: &str) -> Result<ExplanationText, ExplanationUnavailable> {
    let parsed = parse_json(raw).ok_or_else(|| {
        ExplanationUnavailable::MalformedResponse("no JSON object in response".to_string())
    })?;

    let text = ExplanationText {
        summary: parsed.summary.trim().to_string(),
        why_risky: parsed.why_risky.trim().to_string(),
        recommendation: parsed.recommendation.trim().to_string(),
        redline_suggestion: parsed.redline_suggestion.trim().to_string(),
    };

    if !text.is_complete() {
        return Err(ExplanationUnavailable::MalformedResponse(
            "missing explanation fields".to_string(),
        ));
    }

    reject_generic(&format!(
        "{} {} {} {}",
        text.summary, text.why_risky, text.recommendation, text.redline_suggestion
    ))?;

    Ok(text)
}

// ============================================================================
// LLM Explainer
// ============================================================================

/// Explainer backed by a language model
pub struct LlmExplainer {
    client: Arc<dyn LlmClient>,
    cache: ExplanationCache,
}

impl LlmExplainer {
    pub fn new(client: Arc<dyn LlmClient>, cache: ExplanationCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &ExplanationCache {
        &self.cache
    }
}

#[async_trait]
impl ClauseExplainer for LlmExplainer {
    async fn explain(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationText, ExplanationUnavailable> {
        let key = ExplanationKey::new(
            &request.clause.text,
            &request.analysis.rationale_code,
            request.analysis.risk_level,
            request.perspective,
        );
        if let Some(cached) = self.cache.get(&key).await {
            debug!(
                clause_id = %request.clause.id,
                hit_rate = self.cache.stats().hit_rate(),
                "Explanation served from cache"
            );
            return Ok(cached);
        }

        let prompt = explanation_prompt(request);
        let raw = self
            .client
            .generate(&prompt)
            .await
            .map_err(|e| ExplanationUnavailable::Provider(e.to_string()))?;

        let text = parse_explanation(&raw)?;
        self.cache.put(key, text.clone()).await;
        Ok(text)
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, ExplanationUnavailable> {
        let raw = self
            .client
            .generate(&summary_prompt(request))
            .await
            .map_err(|e| ExplanationUnavailable::Provider(e.to_string()))?;

        let summary = raw.trim();
        if summary.is_empty() {
            return Err(ExplanationUnavailable::MalformedResponse(
                "empty summary".to_string(),
            ));
        }
        reject_generic(summary)?;
        Ok(summary.to_string())
    }

    fn source(&self) -> ExplanationSource {
        ExplanationSource::Llm
    }
}

// ============================================================================
// Fallback decorator
// ============================================================================

/// Tries the primary explainer and falls back to templates
///
/// The primary call runs under a timeout and the caller's cancellation
/// token. Results from this type are always complete.
pub struct FallbackExplainer {
    primary: Option<Arc<dyn ClauseExplainer>>,
    fallback: TemplateExplainer,
    timeout: Duration,
}

impl FallbackExplainer {
    pub fn new(primary: Arc<dyn ClauseExplainer>, timeout: Duration) -> Self {
        Self {
            primary: Some(primary),
            fallback: TemplateExplainer::new(),
            timeout,
        }
    }

    /// Templates only; no outbound calls
    pub fn template_only() -> Self {
        Self {
            primary: None,
            fallback: TemplateExplainer::new(),
            timeout: Duration::ZERO,
        }
    }

    /// Build from configuration; an unusable LLM setup degrades to templates
    pub fn from_config(config: &AppConfig) -> Self {
        if !config.llm.enabled {
            info!("LLM explanations disabled, using templates");
            return Self::template_only();
        }

        match create_llm_client(&config.llm) {
            Ok(client) => {
                info!(provider = client.name(), model = %config.llm.model, "LLM explanations enabled");
                let explainer = LlmExplainer::new(
                    Arc::from(client),
                    ExplanationCache::from_config(&config.pipeline),
                );
                Self::new(
                    Arc::new(explainer),
                    Duration::from_secs(config.llm.timeout_secs),
                )
            }
            Err(e) => {
                warn!(error = %e, "LLM client unavailable, using templates");
                Self::template_only()
            }
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    async fn attempt<T>(
        &self,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T, ExplanationUnavailable>>,
    ) -> Result<T, ExplanationUnavailable> {
        if cancel.is_cancelled() {
            return Err(ExplanationUnavailable::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExplanationUnavailable::Cancelled),
            result = tokio::time::timeout(self.timeout, call) => {
                result.unwrap_or(Err(ExplanationUnavailable::Timeout(self.timeout)))
            }
        }
    }

    /// Explanation for one clause with its provenance
    pub async fn explain_with_cancel(
        &self,
        request: &ExplanationRequest,
        cancel: &CancellationToken,
    ) -> (ExplanationText, ExplanationSource) {
        let Some(primary) = &self.primary else {
            return (self.fallback.render(request), ExplanationSource::Fallback);
        };

        match self.attempt(cancel, primary.explain(request)).await {
            Ok(text) if text.is_complete() => (text, primary.source()),
            Ok(_) => {
                warn!(clause_id = %request.clause.id, "Incomplete explanation, using template");
                (self.fallback.render(request), ExplanationSource::Fallback)
            }
            Err(e) => {
                warn!(clause_id = %request.clause.id, reason = %e, "Explanation fell back to template");
                (self.fallback.render(request), ExplanationSource::Fallback)
            }
        }
    }

    /// Executive summary with its provenance
    pub async fn summarize_with_cancel(
        &self,
        request: &SummaryRequest,
        cancel: &CancellationToken,
    ) -> (String, ExplanationSource) {
        let fallback = || crate::summary::fallback_summary(request);

        let Some(primary) = &self.primary else {
            return (fallback(), ExplanationSource::Fallback);
        };

        match self.attempt(cancel, primary.summarize(request)).await {
            Ok(summary) => (summary, primary.source()),
            Err(e) => {
                warn!(reason = %e, "Executive summary fell back to template");
                (fallback(), ExplanationSource::Fallback)
            }
        }
    }
}

#[async_trait]
impl ClauseExplainer for FallbackExplainer {
    async fn explain(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationText, ExplanationUnavailable> {
        let (text, _) = self
            .explain_with_cancel(request, &CancellationToken::new())
            .await;
        Ok(text)
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, ExplanationUnavailable> {
        let (summary, _) = self
            .summarize_with_cancel(request, &CancellationToken::new())
            .await;
        Ok(summary)
    }

    fn source(&self) -> ExplanationSource {
        match &self.primary {
            Some(primary) => primary.source(),
            None => ExplanationSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::{
        Clause, ClauseAnalysis, ClauseType, Perspective, RedlineError, RiskLevel,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GOOD: &str = r#"{"summary": "The company can end the deal at will.",
        "why_risky": "You have no guaranteed term.",
        "recommendation": "Ask for 60 days notice.",
        "redline_suggestion": "Either party may terminate on 60 days written notice."}"#;

    struct MockLlm {
        reply: Result<String, String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmClient for MockLlm {
        async fn generate(&self, _prompt: &str) -> redline_core::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map_err(RedlineError::LlmError)
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn request() -> ExplanationRequest {
        ExplanationRequest {
            clause: Clause::new(
                "2",
                "Termination",
                "The Company may terminate at any time.",
                2,
                ClauseType::Termination,
            ),
            analysis: ClauseAnalysis::matched(
                "2",
                RiskLevel::High,
                "at_will_termination",
                "TERM001",
            ),
            perspective: Perspective::Employee,
            guidance: None,
        }
    }

    fn fallback_over(llm: Arc<MockLlm>, timeout: Duration) -> FallbackExplainer {
        let explainer = LlmExplainer::new(llm, ExplanationCache::default());
        FallbackExplainer::new(Arc::new(explainer), timeout)
    }

    #[test]
    fn test_parse_explanation() {
        let text = tokio_test::assert_ok!(parse_explanation(GOOD));
        assert_eq!(text.recommendation, "Ask for 60 days notice.");

        let wrapped = format!("Here is the answer:\n```json\n{GOOD}\n```");
        assert!(parse_explanation(&wrapped).is_ok());

        let aliased = r#"{"summary": "a", "why_risky": "b", "recommendation": "c", "example_wording": "d"}"#;
        assert_eq!(parse_explanation(aliased).unwrap().redline_suggestion, "d");
    }

    #[test]
    fn test_parse_rejects_bad_answers() {
        assert!(matches!(
            parse_explanation("Sorry, no JSON here."),
            Err(ExplanationUnavailable::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_explanation(r#"{"summary": "a", "why_risky": "b", "recommendation": " "}"#),
            Err(ExplanationUnavailable::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_explanation(
                r#"{"summary": "I cannot assess this.", "why_risky": "b", "recommendation": "c", "redline_suggestion": "d"}"#
            ),
            Err(ExplanationUnavailable::GenericResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_llm_success_is_cached() {
        let llm = Arc::new(MockLlm::replying(GOOD));
        let explainer = fallback_over(Arc::clone(&llm), Duration::from_secs(5));
        let cancel = CancellationToken::new();

        let (text, source) = explainer.explain_with_cancel(&request(), &cancel).await;
        assert_eq!(source, ExplanationSource::Llm);
        assert_eq!(text.summary, "The company can end the deal at will.");

        let (_, source) = explainer.explain_with_cancel(&request(), &cancel).await;
        assert_eq!(source, ExplanationSource::Llm);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let llm = Arc::new(MockLlm {
            reply: Err("rate limited".to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        });
        let explainer = fallback_over(llm, Duration::from_secs(5));

        let (text, source) = explainer
            .explain_with_cancel(&request(), &CancellationToken::new())
            .await;
        assert_eq!(source, ExplanationSource::Fallback);
        assert!(text.is_complete());
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let llm = Arc::new(MockLlm::replying("The clause looks risky."));
        let explainer = fallback_over(llm, Duration::from_secs(5));

        let (text, source) = explainer
            .explain_with_cancel(&request(), &CancellationToken::new())
            .await;
        assert_eq!(source, ExplanationSource::Fallback);
        assert!(text.why_risky.starts_with("You have no job security"));
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let llm = Arc::new(MockLlm {
            reply: Ok(GOOD.to_string()),
            delay: Duration::from_secs(30),
            calls: AtomicUsize::new(0),
        });
        let explainer = fallback_over(llm, Duration::from_millis(50));

        let (text, source) = explainer
            .explain_with_cancel(&request(), &CancellationToken::new())
            .await;
        assert_eq!(source, ExplanationSource::Fallback);
        assert!(text.is_complete());
    }

    #[tokio::test]
    async fn test_cancelled_request_skips_llm() {
        let llm = Arc::new(MockLlm::replying(GOOD));
        let explainer = fallback_over(Arc::clone(&llm), Duration::from_secs(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (_, source) = explainer.explain_with_cancel(&request(), &cancel).await;
        assert_eq!(source, ExplanationSource::Fallback);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_template_only() {
        let explainer = FallbackExplainer::template_only();
        assert!(!explainer.has_primary());
        assert_eq!(explainer.source(), ExplanationSource::Fallback);

        let summary = SummaryRequest {
            overall_risk_level: RiskLevel::Low,
            risk_score: 0,
            perspective: Perspective::Buyer,
            total_clauses: 3,
            high_risk: 0,
            medium_risk: 0,
            high_titles: Vec::new(),
            medium_titles: Vec::new(),
        };
        let (text, source) = explainer
            .summarize_with_cancel(&summary, &CancellationToken::new())
            .await;
        assert_eq!(source, ExplanationSource::Fallback);
        assert!(text.contains("LOW RISK"));
    }

    #[test]
    fn test_disabled_config_uses_templates() {
        let explainer = FallbackExplainer::from_config(&AppConfig::default());
        assert!(!explainer.has_primary());
    }
}
