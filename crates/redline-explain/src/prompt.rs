//! Prompt construction
//!
//! Prompts hand the model the facts the rule engine established and ask it
//! to explain them, never to judge the clause again.

use std::fmt::Write;

use crate::{ExplanationRequest, SummaryRequest};

/// Clause text sent to the model is cut to this many characters
const EXCERPT_CHARS: usize = 1500;

/// Clause titles listed per risk level in the summary prompt
const MAX_TITLES: usize = 5;

/// Prompt for a four-field clause explanation
pub fn explanation_prompt(request: &ExplanationRequest) -> String {
    let clause = &request.clause;
    let analysis = &request.analysis;

    let mut prompt = String::from(
        "You are a contract law expert. Explain the legal risk that an automated rule \
         engine detected in the clause below. Do not invent new risks and do not give \
         generic legal advice; base every statement on the clause text and the detected facts.\n\n",
    );

    let _ = writeln!(prompt, "=== DETECTED RISK ===");
    let _ = writeln!(prompt, "Clause: {}", request.display_title());
    let _ = writeln!(prompt, "Clause type: {}", clause.primary_type.label());
    let _ = writeln!(prompt, "Risk level: {}", analysis.risk_level);
    let _ = writeln!(prompt, "Rationale: {}", analysis.rationale_code);
    if let Some(rule_id) = request.rule_id() {
        let _ = writeln!(prompt, "Rule: {rule_id}");
    }
    let _ = writeln!(prompt, "Reader perspective: {}", request.perspective);

    if let Some(guidance) = &request.guidance {
        let _ = writeln!(prompt, "\n=== RULE GUIDANCE ===");
        let _ = writeln!(prompt, "Rule name: {}", guidance.rule_name);
        let _ = writeln!(
            prompt,
            "Description: {}",
            guidance.description_for(request.perspective)
        );
        let _ = writeln!(prompt, "Why it is risky: {}", guidance.why_risky);
        let _ = writeln!(prompt, "Recommended action: {}", guidance.recommendation);
    }

    let _ = writeln!(prompt, "\n=== CLAUSE TEXT ===");
    let _ = writeln!(prompt, "\"{}\"", clause.excerpt(EXCERPT_CHARS));

    prompt.push_str(
        "\n=== YOUR TASK ===\n\
         Answer from the reader's perspective with a single JSON object:\n\
         {\n\
         \x20 \"summary\": \"1-2 sentences on what the clause does\",\n\
         \x20 \"why_risky\": \"why the detected facts are risky for the reader\",\n\
         \x20 \"recommendation\": \"what the reader should negotiate\",\n\
         \x20 \"redline_suggestion\": \"replacement contract wording\"\n\
         }\n\
         Return only the JSON object.",
    );

    prompt
}

/// Prompt for the contract-level executive summary
pub fn summary_prompt(request: &SummaryRequest) -> String {
    let mut prompt = String::from(
        "You are a contract law expert providing risk summaries. Base your summary only \
         on the detected risks listed below and do not add new risk categories.\n\n",
    );

    let _ = writeln!(prompt, "=== DETECTED RISKS ===");
    let _ = writeln!(prompt, "Overall risk level: {}", request.overall_risk_level);
    let _ = writeln!(prompt, "Risk score: {}/100", request.risk_score);
    let _ = writeln!(prompt, "Clauses reviewed: {}", request.total_clauses);
    let _ = writeln!(prompt, "HIGH risk clauses: {}", request.high_risk);
    let _ = writeln!(prompt, "MEDIUM risk clauses: {}", request.medium_risk);

    for (label, titles) in [
        ("HIGH", &request.high_titles),
        ("MEDIUM", &request.medium_titles),
    ] {
        if titles.is_empty() {
            continue;
        }
        let _ = writeln!(prompt, "\n{label} RISK CLAUSES:");
        for title in titles.iter().take(MAX_TITLES) {
            let _ = writeln!(prompt, "- {title}");
        }
    }

    let _ = writeln!(
        prompt,
        "\nAnalyzing from perspective: {}",
        request.perspective
    );
    prompt.push_str(
        "\nWrite a brief (2-3 sentence) executive summary of the contract's overall risk \
         profile. Return plain text only.",
    );

    prompt
}
