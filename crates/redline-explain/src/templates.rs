//! Deterministic explanation templates
//!
//! Text is chosen in three tiers: the guidance of the rule that fired
//! (reframed for the reader's perspective where a frame exists), then a
//! template for the clause type, then a generic template. Every tier yields
//! four non-empty fields.

use async_trait::async_trait;
use tracing::trace;

use redline_core::{
    ClauseType, ExplanationSource, ExplanationText, ExplanationUnavailable, Perspective,
    RiskLevel,
};

use crate::summary::fallback_summary;
use crate::{ClauseExplainer, ExplanationRequest, SummaryRequest};

const GENERIC_REDLINE: &str = "Negotiate different terms to address the identified risk.";

// ============================================================================
// Perspective frames
// ============================================================================

/// Perspective-specific wording for a rule
struct Frame {
    what_it_means: &'static str,
    why_risky: &'static str,
}

fn perspective_frame(rule_id: &str, perspective: Perspective) -> Option<Frame> {
    use Perspective as P;

    let (what_it_means, why_risky) = match (rule_id, perspective) {
        ("TERM001", P::Employee) => (
            "Your employer can end the relationship at any time, for any reason or no reason at all, without advance notice.",
            "You have no job security. Even if you perform well, you could be let go tomorrow with no recourse.",
        ),
        ("TERM001", P::Employer) => (
            "You can end the relationship at your discretion without being locked into a fixed commitment.",
            "This gives you flexibility, but it may make it harder to attract people who want stability.",
        ),
        ("TERM001", P::Receiving) => (
            "The disclosing party can end the agreement at any time, potentially cutting off your access to confidential information.",
            "If you are building a product or business on the disclosed information, a sudden termination could derail your plans.",
        ),
        ("TERM001", P::Vendor) => (
            "Your client can cancel the contract anytime without cause, ending your revenue stream.",
            "You cannot count on the contract value for planning, and setup, training and onboarding costs could be wasted.",
        ),
        ("TERM003", P::Buyer) => (
            "If you terminate early, you forfeit all prepaid fees even if services were not delivered.",
            "If the vendor underperforms or you need to exit, you lose your entire investment with no way to recover it.",
        ),
        ("TERM003", P::Vendor) => (
            "You keep all fees even if the client terminates before completion.",
            "This is generally favorable to you, but aggressive terms may damage client relationships or lead to disputes.",
        ),
        ("CONF001", P::Receiving) => (
            "You must keep their secrets forever, with no expiration date.",
            "Decades from now you could still be obligated to protect information that is obsolete or already public.",
        ),
        ("CONF001", P::Disclosing) => (
            "Your confidential information is protected indefinitely.",
            "This provides strong protection, but overly aggressive terms may discourage partners from signing.",
        ),
        ("IP001", P::Employee) => (
            "Everything you create, including code, designs and ideas, belongs to your employer.",
            "You cannot reuse your own work, tools or methods in future jobs or side projects, and work done on your own time may be claimed.",
        ),
        ("IP001", P::Employer) => (
            "You own all work product created during the engagement.",
            "This is standard for employers, but overly broad clauses can create enforcement issues or discourage talented hires.",
        ),
        ("IP001", P::Vendor) => (
            "All code, tools and frameworks you create for this project become the client's property.",
            "You cannot reuse your own general-purpose utilities or methods in other client projects.",
        ),
        ("NONC001", P::Employee) => (
            "After leaving, you are barred from working in your field across a broad territory.",
            "This could force you to change careers, relocate or stay unemployed. Many non-competes are unenforceable, but fighting them is expensive.",
        ),
        ("NONC001", P::Employer) => (
            "Former staff cannot work for competitors or start competing businesses for a period.",
            "Overly broad non-competes are often unenforceable and can damage your reputation as an employer.",
        ),
        ("WAR001", P::Buyer) => (
            "The vendor gives no guarantee that deliverables will work or meet your needs.",
            "If the product is defective you have no contractual recourse; you pay full price for as-is quality.",
        ),
        ("WAR001", P::Vendor) => (
            "You are not liable if deliverables do not meet client expectations.",
            "This protects you but may lead to disputes and damaged relationships if clients feel misled.",
        ),
        ("PAY002", P::Buyer) => (
            "You must pay the entire contract value upfront before any work begins.",
            "If the vendor disappears, underperforms or goes bankrupt, you have already paid and have limited recourse.",
        ),
        ("PAY002", P::Vendor) => (
            "You receive full payment upfront, improving your cash flow.",
            "Clients may resist large upfront payments, and you lose leverage if disputes arise during delivery.",
        ),
        _ => return None,
    };

    Some(Frame {
        what_it_means,
        why_risky,
    })
}

// ============================================================================
// Clause type templates
// ============================================================================

struct ClauseTemplate {
    why_risky: &'static str,
    recommendation: &'static str,
    redline_suggestion: &'static str,
}

fn clause_template(clause_type: ClauseType) -> Option<ClauseTemplate> {
    use ClauseType as C;

    let (why_risky, recommendation, redline_suggestion) = match clause_type {
        C::Indemnification => (
            "Indemnity terms decide who pays when third parties sue; broad wording can shift losses you do not control onto you.",
            "Limit the indemnity to claims caused by your own breach or negligence and cap it.",
            "Add: 'The indemnifying party's aggregate liability under this Section shall not exceed the fees paid under this Agreement.'",
        ),
        C::Termination => (
            "Exit terms decide how long the relationship is guaranteed and what happens to money and work in progress.",
            "Make termination rights mutual, require written notice and settle refunds for unused services.",
            "Add: 'Either party may terminate this Agreement upon [30] days prior written notice.'",
        ),
        C::Liability => (
            "Liability terms set how much can be recovered when something goes wrong.",
            "Agree a mutual cap tied to contract value and exclude indirect damages for both parties.",
            "Add: 'Each party's total liability shall not exceed the fees paid in the twelve (12) months preceding the claim.'",
        ),
        C::Payment => (
            "Payment terms fix cash-flow obligations and can lock you into renewals or prepayments.",
            "Tie payments to delivery milestones and require opt-in renewal.",
            "Add: 'Fees shall be invoiced upon completion of each milestone and are payable within thirty (30) days.'",
        ),
        C::Confidentiality => (
            "Confidentiality terms govern what you may disclose and for how long.",
            "Define confidential information narrowly, add standard exclusions and a fixed term.",
            "Add: 'These obligations shall survive for three (3) years from disclosure, except for trade secrets.'",
        ),
        C::IntellectualProperty => (
            "Ownership terms decide who may use and build on the work product.",
            "Retain rights to pre-existing materials and general know-how, and license rather than assign where possible.",
            "Add: 'Each party retains all rights in its pre-existing intellectual property.'",
        ),
        C::GoverningLaw => (
            "Governing law and forum decide where and under which rules disputes are fought.",
            "Choose a neutral law and forum or make jurisdiction non-exclusive.",
            "Replace with: 'The courts of [neutral venue] shall have non-exclusive jurisdiction.'",
        ),
        C::DisputeResolution => (
            "Without a structured process, disputes default to slow and costly litigation.",
            "Add escalation steps: negotiation, then mediation, then arbitration or court.",
            "Add: 'The parties shall first negotiate in good faith for thirty (30) days, then proceed to mediation.'",
        ),
        C::NonCompete => (
            "Restrictive covenants limit where you can work or do business after the agreement ends.",
            "Narrow the duration, territory and restricted activities to what protects a legitimate interest.",
            "Limit to: 'six (6) months, within [area], in a directly competing role only.'",
        ),
        C::Warranty => (
            "Warranty terms decide what recourse exists when deliverables do not work.",
            "Ask for a workmanlike-performance warranty and a conformity period with a repair or refund remedy.",
            "Add: 'Provider warrants that deliverables will conform to the specifications for ninety (90) days.'",
        ),
        C::ForceMajeure => (
            "A broad force majeure clause can excuse the other party's performance in situations within their control.",
            "List qualifying events specifically and add a termination right for prolonged events.",
            "Add: 'If a force majeure event continues for more than thirty (30) days, either party may terminate.'",
        ),
        C::Assignment => (
            "Free assignment lets the contract move to a party you never agreed to deal with.",
            "Require consent for assignment, with a carve-out for mergers if needed.",
            "Add: 'Neither party may assign this Agreement without the other party's prior written consent.'",
        ),
        C::Amendment => (
            "Unilateral amendment rights let terms change after signature without your agreement.",
            "Require amendments to be in writing and signed by both parties.",
            "Add: 'This Agreement may be amended only by a written instrument signed by both parties.'",
        ),
        C::Severability => (
            "Severability wording affects what survives if part of the contract is struck down.",
            "Make sure invalid terms are replaced by the closest valid equivalent.",
            "Add: 'Any invalid provision shall be replaced by a valid provision closest to the parties' intent.'",
        ),
        C::EntireAgreement => (
            "An entire-agreement clause can erase promises made during negotiation.",
            "Attach any side commitments you rely on as schedules to the agreement.",
            "Add: 'including the schedules attached hereto, which form part of this Agreement.'",
        ),
        C::General => return None,
    };

    Some(ClauseTemplate {
        why_risky,
        recommendation,
        redline_suggestion,
    })
}

fn humanize(code: &str) -> String {
    code.replace('_', " ")
}

fn level_headline(level: RiskLevel, title: &str) -> String {
    match level {
        RiskLevel::High => format!(
            "CRITICAL: The '{title}' clause contains HIGH RISK terms that require immediate attention."
        ),
        RiskLevel::Medium => {
            format!("WARNING: The '{title}' clause has MEDIUM RISK elements worth reviewing.")
        }
        RiskLevel::Low => format!("The '{title}' clause appears standard with LOW RISK."),
    }
}

fn first_non_empty(candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Template explainer
// ============================================================================

/// Explainer that never calls out and never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl TemplateExplainer {
    pub fn new() -> Self {
        Self
    }

    /// Four complete fields for a flagged clause
    pub fn render(&self, request: &ExplanationRequest) -> ExplanationText {
        let title = request.display_title();
        let level = request.analysis.risk_level;
        let rationale = humanize(&request.analysis.rationale_code);
        let frame = request
            .rule_id()
            .and_then(|id| perspective_frame(id, request.perspective));
        let template = clause_template(request.clause.primary_type);
        let guidance = request.guidance.as_ref();

        let summary = first_non_empty(&[
            frame.as_ref().map_or("", |f| f.what_it_means),
            guidance.map_or("", |g| g.description_for(request.perspective)),
        ])
        .map(|s| format!("{} {s}", level_headline(level, &title)))
        .unwrap_or_else(|| {
            format!(
                "{} It was flagged for {rationale}.",
                level_headline(level, &title)
            )
        });

        let why_risky = first_non_empty(&[
            frame.as_ref().map_or("", |f| f.why_risky),
            guidance.map_or("", |g| g.why_risky.as_str()),
            template.as_ref().map_or("", |t| t.why_risky),
        ])
        .unwrap_or_else(|| {
            format!("The clause was flagged for {rationale}, which can shift risk onto you.")
        });

        let recommendation = first_non_empty(&[
            guidance.map_or("", |g| g.recommendation.as_str()),
            template.as_ref().map_or("", |t| t.recommendation),
        ])
        .unwrap_or_else(|| {
            "Review this clause with counsel and negotiate balanced terms before signing."
                .to_string()
        });

        let redline_suggestion = first_non_empty(&[
            guidance
                .and_then(|g| g.redline_suggestion.as_deref())
                .unwrap_or(""),
            template.as_ref().map_or("", |t| t.redline_suggestion),
            GENERIC_REDLINE,
        ])
        .unwrap_or_else(|| GENERIC_REDLINE.to_string());

        trace!(clause_id = %request.clause.id, "Rendered template explanation");

        ExplanationText {
            summary,
            why_risky,
            recommendation,
            redline_suggestion,
        }
    }
}

#[async_trait]
impl ClauseExplainer for TemplateExplainer {
    async fn explain(
        &self,
        request: &ExplanationRequest,
    ) -> Result<ExplanationText, ExplanationUnavailable> {
        Ok(self.render(request))
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, ExplanationUnavailable> {
        Ok(fallback_summary(request))
    }

    fn source(&self) -> ExplanationSource {
        ExplanationSource::Fallback
    }
}
