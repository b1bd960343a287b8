//! Contract-level wording: the fallback executive summary and the
//! deterministic overall recommendations.

use redline_core::{Perspective, RiskLevel};

use crate::SummaryRequest;

fn level_sentence(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => {
            "HIGH RISK: This contract contains serious issues that could expose you to \
             significant legal or financial harm. Legal review strongly recommended."
        }
        RiskLevel::Medium => {
            "MEDIUM RISK: This contract has some concerning terms that should be reviewed \
             and potentially negotiated. Consider consulting a lawyer."
        }
        RiskLevel::Low => {
            "LOW RISK: This contract appears relatively balanced with no major red flags. \
             Standard review recommended."
        }
    }
}

/// Executive summary built from counts alone
pub fn fallback_summary(request: &SummaryRequest) -> String {
    let high = request.high_risk;
    let medium = request.medium_risk;

    let counts = if high >= 3 {
        format!(
            "This contract contains {high} HIGH RISK issues that require immediate legal review and negotiation."
        )
    } else if high >= 1 {
        format!(
            "This contract contains {high} HIGH RISK issue(s) and {medium} MEDIUM RISK issue(s) that require attention."
        )
    } else if medium >= 5 {
        format!(
            "This contract contains {medium} MEDIUM RISK issues that should be reviewed and potentially negotiated."
        )
    } else {
        "This contract appears to have minimal high-risk issues, but review is still recommended."
            .to_string()
    };

    format!("{counts} {}", level_sentence(request.overall_risk_level))
}

/// Deterministic advice for the whole contract
pub fn overall_recommendations(
    high: usize,
    medium: usize,
    overall: RiskLevel,
    perspective: Perspective,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if high >= 3 {
        recommendations.push("CRITICAL: Have a lawyer review this contract before signing.");
        recommendations.push("Do not sign without negotiating the high-risk clauses identified.");
    } else if high >= 1 {
        recommendations.push("Strongly consider legal counsel to address high-risk terms.");
    }

    if medium >= 5 {
        recommendations
            .push("Review and negotiate medium-risk clauses to improve overall terms.");
    }

    if perspective.is_counterparty_drafted() {
        recommendations.push(
            "Remember: the other party drafted this contract to favor their interests. \
             It is normal and expected to negotiate changes.",
        );
    } else {
        recommendations.push(
            "Consider whether these terms might discourage good candidates or partners from \
             signing. Balance protection with fairness.",
        );
    }

    recommendations.push(match overall {
        RiskLevel::High => {
            "Consider requesting a complete contract revision with more balanced terms."
        }
        RiskLevel::Medium => "Use the redline suggestions as negotiation points.",
        RiskLevel::Low => "Perform standard due diligence before signing.",
    });

    recommendations.push("Document all negotiated changes in writing before signing.");
    recommendations.push("Consider requesting a side letter addressing the flagged issues.");

    recommendations.into_iter().map(String::from).collect()
}
