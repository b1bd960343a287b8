//! Rule definitions and predicates
//!
//! A rule pairs a predicate over clause text and entities with a default
//! risk level, per-perspective level overrides and reviewer guidance.

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};

use redline_core::{
    ClauseScoringError, ClauseThresholds, ClauseType, Entity, EntityKind, Perspective,
    RiskLevel, RuleGuidance, ThresholdKey,
};

use crate::{Result, RiskError};

/// Compile a rule pattern: case-insensitive, `.` spans line breaks
pub fn compile_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

// ============================================================================
// Predicates
// ============================================================================

/// Inputs a predicate is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub text: &'a str,
    pub entities: &'a [Entity],
    pub thresholds: &'a ClauseThresholds,
}

impl<'a> EvalContext<'a> {
    pub fn new(text: &'a str, entities: &'a [Entity], thresholds: &'a ClauseThresholds) -> Self {
        Self {
            text,
            entities,
            thresholds,
        }
    }

    fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities.iter().filter(move |e| e.kind == kind)
    }
}

/// Condition over a clause
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Any pattern matches the text
    AnyPattern(Vec<Regex>),

    /// `pattern` matches somewhere without `absent` starting within `window` chars after it
    PatternWithout {
        pattern: Regex,
        absent: Regex,
        window: usize,
    },

    Not(Box<Predicate>),

    All(Vec<Predicate>),

    /// Some AMOUNT entity is below the threshold
    AmountBelow(ThresholdKey),

    /// Some DURATION entity is shorter than the threshold
    DurationBelow(ThresholdKey),

    /// Some DURATION entity is longer than the threshold
    DurationAbove(ThresholdKey),
}

impl Predicate {
    pub fn any_pattern<S: AsRef<str>>(patterns: &[S]) -> std::result::Result<Self, regex::Error> {
        patterns
            .iter()
            .map(|p| compile_pattern(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Self::AnyPattern)
    }

    pub fn pattern_without(
        pattern: &str,
        absent: &str,
        window: usize,
    ) -> std::result::Result<Self, regex::Error> {
        Ok(Self::PatternWithout {
            pattern: compile_pattern(pattern)?,
            absent: compile_pattern(absent)?,
            window,
        })
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate against one clause
    ///
    /// Fails only when an entity the predicate reads has an unreadable
    /// normalised value.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> std::result::Result<bool, ClauseScoringError> {
        match self {
            Self::AnyPattern(patterns) => Ok(patterns.iter().any(|p| p.is_match(ctx.text))),
            Self::PatternWithout {
                pattern,
                absent,
                window,
            } => Ok(pattern_without(ctx.text, pattern, absent, *window)),
            Self::Not(inner) => Ok(!inner.evaluate(ctx)?),
            Self::All(predicates) => {
                for predicate in predicates {
                    if !predicate.evaluate(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::AmountBelow(key) => {
                let Some(limit) = ctx.thresholds.amount(*key) else {
                    return Ok(false);
                };
                for entity in ctx.of_kind(EntityKind::Amount) {
                    if entity.amount()? < limit {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::DurationBelow(key) => {
                let Some(limit) = ctx.thresholds.days(*key) else {
                    return Ok(false);
                };
                for entity in ctx.of_kind(EntityKind::Duration) {
                    if entity.duration_days()? < limit {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::DurationAbove(key) => {
                let Some(limit) = ctx.thresholds.days(*key) else {
                    return Ok(false);
                };
                for entity in ctx.of_kind(EntityKind::Duration) {
                    if entity.duration_days()? > limit {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn pattern_without(text: &str, pattern: &Regex, absent: &Regex, window: usize) -> bool {
    pattern.find_iter(text).any(|m| {
        let rest = &text[m.end()..];
        let followed = absent
            .find(rest)
            .is_some_and(|a| rest[..a.start()].chars().count() <= window);
        !followed
    })
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyPattern(patterns) => {
                let list: Vec<String> = patterns.iter().map(|p| format!("/{}/", p.as_str())).collect();
                write!(f, "any({})", list.join(", "))
            }
            Self::PatternWithout {
                pattern,
                absent,
                window,
            } => write!(
                f,
                "/{}/ without /{}/ within {window}",
                pattern.as_str(),
                absent.as_str()
            ),
            Self::Not(inner) => write!(f, "not({inner})"),
            Self::All(predicates) => {
                let list: Vec<String> = predicates.iter().map(|p| p.to_string()).collect();
                write!(f, "all({})", list.join(", "))
            }
            Self::AmountBelow(key) => write!(f, "amount_below({key:?})"),
            Self::DurationBelow(key) => write!(f, "duration_below({key:?})"),
            Self::DurationAbove(key) => write!(f, "duration_above({key:?})"),
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

/// A risk rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub rationale_code: String,

    /// Clause types the rule is evaluated for
    pub clause_types: Vec<ClauseType>,

    /// Perspectives the rule is limited to; `None` means all
    pub perspectives: Option<Vec<Perspective>>,

    pub default_level: RiskLevel,
    pub perspective_levels: BTreeMap<Perspective, RiskLevel>,
    pub predicate: Predicate,
    pub guidance: RuleGuidance,
}

impl Rule {
    /// Create a rule with empty guidance
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rationale_code: impl Into<String>,
        default_level: RiskLevel,
        predicate: Predicate,
    ) -> Self {
        Self {
            id: id.into(),
            rationale_code: rationale_code.into(),
            clause_types: Vec::new(),
            perspectives: None,
            default_level,
            perspective_levels: BTreeMap::new(),
            predicate,
            guidance: RuleGuidance {
                rule_name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn scoped(mut self, clause_types: &[ClauseType]) -> Self {
        self.clause_types = clause_types.to_vec();
        self
    }

    pub fn only_for(mut self, perspectives: &[Perspective]) -> Self {
        self.perspectives = Some(perspectives.to_vec());
        self
    }

    pub fn with_level(mut self, perspective: Perspective, level: RiskLevel) -> Self {
        self.perspective_levels.insert(perspective, level);
        self
    }

    pub fn with_guidance(
        mut self,
        description: &str,
        why_risky: &str,
        recommendation: &str,
        redline_suggestion: &str,
    ) -> Self {
        self.guidance.description = description.to_string();
        self.guidance.why_risky = why_risky.to_string();
        self.guidance.recommendation = recommendation.to_string();
        self.guidance.redline_suggestion =
            (!redline_suggestion.is_empty()).then(|| redline_suggestion.to_string());
        self
    }

    pub fn with_description_for(mut self, perspective: Perspective, description: &str) -> Self {
        self.guidance
            .perspective_descriptions
            .insert(perspective, description.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.guidance.rule_name
    }

    /// Level for a perspective, falling back to the default level
    pub fn level_for(&self, perspective: Perspective) -> RiskLevel {
        self.perspective_levels
            .get(&perspective)
            .copied()
            .unwrap_or(self.default_level)
    }

    /// Whether the rule belongs in the table entry for `(clause_type, perspective)`
    pub fn applies_to(&self, clause_type: ClauseType, perspective: Perspective) -> bool {
        self.clause_types.contains(&clause_type)
            && self
                .perspectives
                .as_ref()
                .map_or(true, |scope| scope.contains(&perspective))
    }
}

// ============================================================================
// Built-in rules
// ============================================================================

fn any(rule_id: &str, patterns: &[&str]) -> Result<Predicate> {
    Predicate::any_pattern(patterns).map_err(|source| RiskError::InvalidPattern {
        rule_id: rule_id.to_string(),
        source,
    })
}

fn without(rule_id: &str, pattern: &str, absent: &str, window: usize) -> Result<Predicate> {
    Predicate::pattern_without(pattern, absent, window).map_err(|source| {
        RiskError::InvalidPattern {
            rule_id: rule_id.to_string(),
            source,
        }
    })
}

/// Language that excludes a damages category
const DAMAGES_EXCLUSION: &[&str] = &[
    r"\bin\s+no\s+event\b",
    r"\b(?:shall|will)\s+not\s+be\s+liable\b",
    r"\bneither\s+party\s+(?:shall|will)\s+be\s+liable\b",
    r"\bexclud(?:e|es|ed|ing)\b",
    r"\bwaive[sd]?\b",
    r"\bdisclaim",
];

/// The built-in rule set, in declaration order
pub fn builtin_rules() -> Result<Vec<Rule>> {
    use ClauseType as C;
    use Perspective as P;
    use RiskLevel::{High, Low, Medium};

    Ok(vec![
        // ---------------------------------------------------------------- Indemnification
        Rule::new(
            "IND001",
            "Unlimited Indemnification",
            "uncapped_liability",
            High,
            any(
                "IND001",
                &[
                    r"\bunlimited\b.*\bindemnif",
                    r"\bindemnif\w*\b.{0,200}?\bwithout\s+(?:any\s+)?limit(?:ation)?s?\b",
                    r"\bindemnif\w*\b.{0,200}?\bunlimited\b",
                    r"\bto\s+the\s+fullest\s+extent\b",
                ],
            )?,
        )
        .scoped(&[C::Indemnification])
        .with_guidance(
            "Unlimited indemnification obligation",
            "This could expose you to bankruptcy-level financial liability if something goes wrong.",
            "Negotiate a cap on indemnification (e.g., limited to contract value or a specific dollar amount).",
            "Add: 'provided that the aggregate liability for indemnification shall not exceed the total fees paid under this Agreement.'",
        ),
        Rule::new(
            "IND002",
            "Broad Indemnification Scope",
            "broad_indemnity_scope",
            High,
            any(
                "IND002",
                &[
                    r"\bindemnif.*\ball\b.*\bclaims\b",
                    r"\bdefend.*against\s+any\b",
                    r"\bindemnif.*\bany\s+and\s+all\b",
                ],
            )?,
        )
        .scoped(&[C::Indemnification])
        .with_guidance(
            "Broad indemnification scope covering all claims",
            "You could be responsible even for issues outside your control or caused by the other party.",
            "Limit indemnification to claims arising solely from your negligence, willful misconduct, or breach of contract.",
            "Replace 'all claims' with: 'claims arising solely from the indemnifying party's negligence or breach of this Agreement.'",
        ),
        Rule::new(
            "IND003",
            "Attorney Fees Included",
            "attorney_fees_shifted",
            Medium,
            any(
                "IND003",
                &[
                    r"\bincluding.*attorney'?s?.*fees\b",
                    r"\battorney'?s?.*fees.*and.*costs\b",
                    r"\blegal.*fees.*expenses\b",
                ],
            )?,
        )
        .scoped(&[C::Indemnification])
        .with_guidance(
            "Indemnification includes attorney fees",
            "Legal defense costs can exceed actual damages, significantly increasing your financial exposure.",
            "Request mutual attorney fee provisions or a cap on legal costs.",
            "Add: 'reasonable attorney fees, not to exceed $[amount].'",
        ),
        // ---------------------------------------------------------------- Liability
        Rule::new(
            "LIAB001",
            "Unlimited Liability",
            "uncapped_liability",
            High,
            any(
                "LIAB001",
                &[
                    r"\bunlimited\s+liability\b",
                    r"\bno\b.{0,40}\bcap\b.{0,40}\bliability\b",
                    r"\bliable\s+for\s+all\b",
                    r"\bliab\w*\b.{0,100}?\bwithout\s+(?:any\s+)?limit(?:ation)?s?\b",
                ],
            )?,
        )
        .scoped(&[C::Liability])
        .with_guidance(
            "Unlimited liability exposure",
            "A single incident could result in catastrophic financial loss with no upper bound.",
            "Insist on a liability cap (typically 1-2x annual contract fees or a specific dollar amount).",
            "Add: 'Except for gross negligence or willful misconduct, each party's total liability shall not exceed the greater of (i) the fees paid in the 12 months preceding the claim or (ii) $[amount].'",
        ),
        Rule::new(
            "LIAB002",
            "Consequential Damages Allowed",
            "consequential_damages_exposure",
            High,
            Predicate::All(vec![
                any(
                    "LIAB002",
                    &[
                        r"\bconsequential\s+damages\b",
                        r"\bindirect\s+damages\b",
                        r"\bincidental\s+damages\b",
                        r"\blost\s+profits?\b",
                    ],
                )?,
                any("LIAB002", DAMAGES_EXCLUSION)?.negate(),
            ]),
        )
        .scoped(&[C::Liability])
        .with_guidance(
            "Consequential or indirect damages not excluded",
            "These damages (lost profits, business interruption) can far exceed the contract value and are hard to predict or control.",
            "Add a mutual exclusion of consequential, indirect, and punitive damages.",
            "Add: 'IN NO EVENT SHALL EITHER PARTY BE LIABLE FOR CONSEQUENTIAL, INDIRECT, INCIDENTAL, SPECIAL, OR PUNITIVE DAMAGES, OR LOST PROFITS.'",
        ),
        Rule::new(
            "LIAB003",
            "Punitive Damages",
            "punitive_damages",
            High,
            Predicate::All(vec![
                any(
                    "LIAB003",
                    &[r"\bpunitive\s+damages\b", r"\bexemplary\s+damages\b"],
                )?,
                any("LIAB003", DAMAGES_EXCLUSION)?.negate(),
            ]),
        )
        .scoped(&[C::Liability])
        .with_guidance(
            "Punitive damages allowed",
            "Punitive damages are designed to punish and can be many times actual damages.",
            "Explicitly exclude punitive damages for both parties.",
            "Add: 'Neither party shall be liable for punitive or exemplary damages.'",
        ),
        Rule::new(
            "LIAB004",
            "Low Liability Cap",
            "low_liability_cap",
            Medium,
            Predicate::All(vec![
                any(
                    "LIAB004",
                    &[
                        r"\bshall\s+not\s+exceed\b",
                        r"\blimited\s+to\b",
                        r"\bcap(?:ped)?\b",
                        r"\baggregate\s+liability\b",
                    ],
                )?,
                Predicate::AmountBelow(ThresholdKey::LiabilityCap),
            ]),
        )
        .scoped(&[C::Liability])
        .with_level(P::Vendor, Low)
        .with_guidance(
            "Liability cap is below a typical recovery floor",
            "A low cap may leave your actual losses largely unrecoverable if the other party fails to perform.",
            "Tie the cap to fees paid or payable over 12 months, or raise it to a figure that reflects realistic losses.",
            "Replace the cap with: 'the greater of the fees paid or payable in the twelve (12) months preceding the claim or $[amount].'",
        )
        .with_description_for(
            P::Vendor,
            "A low cap limits your own exposure under the contract.",
        ),
        // ---------------------------------------------------------------- Termination
        Rule::new(
            "TERM001",
            "At-Will Termination",
            "at_will_termination",
            High,
            any(
                "TERM001",
                &[
                    r"\bterminat\w*\b.{0,80}?\bat\s+any\s+time\b",
                    r"\btermination\b.{0,40}?\bwithout\s+cause\b",
                    r"\bterminat\w*\b.{0,40}?\bfor\s+convenience\b",
                    r"\bat[\s-]+will\b",
                    r"\bfor\s+any\s+reason\s+or\s+no\s+reason\b",
                ],
            )?,
        )
        .scoped(&[C::Termination])
        .with_level(P::Employer, Low)
        .with_level(P::Buyer, Low)
        .with_level(P::Receiving, Medium)
        .with_level(P::Disclosing, Medium)
        .with_guidance(
            "Termination at-will without cause",
            "The other party can end the contract anytime without reason, leaving you with no guarantee of contract duration or return on investment.",
            "Require a written notice period (e.g., 30-90 days) or limit termination to 'for cause' only.",
            "Replace with: 'Either party may terminate this Agreement for cause upon 30 days written notice, or for convenience upon 90 days written notice.'",
        )
        .with_description_for(
            P::Employee,
            "Your employer can end the relationship at any time without cause, leaving you with no job security.",
        )
        .with_description_for(
            P::Employer,
            "You can end the relationship flexibly when needed, which preserves management discretion.",
        )
        .with_description_for(
            P::Receiving,
            "The disclosing party can terminate at will, potentially cutting off your access to needed information.",
        )
        .with_description_for(
            P::Vendor,
            "The client can end the contract anytime, leaving you with no revenue guarantee.",
        )
        .with_description_for(
            P::Buyer,
            "You keep the flexibility to end the vendor relationship if needed.",
        ),
        Rule::new(
            "TERM002",
            "Immediate Termination",
            "immediate_termination",
            Medium,
            any(
                "TERM002",
                &[
                    r"\bimmediate\s+termination\b",
                    r"\bterminat\w*\b.{0,40}?\bimmediately\b",
                    r"\beffective\s+immediately\b",
                ],
            )?,
        )
        .scoped(&[C::Termination])
        .with_guidance(
            "Immediate termination without notice period",
            "There is no time to transition, recover costs, or find alternatives.",
            "Negotiate a minimum notice period except for material breach.",
            "Add: 'except in cases of material breach, either party shall provide [30] days written notice before termination.'",
        ),
        Rule::new(
            "TERM003",
            "No Refund on Termination",
            "no_refund_on_termination",
            High,
            any(
                "TERM003",
                &[
                    r"\bno\b.{0,40}\brefunds?\b",
                    r"\bnon-?refundable\b",
                    r"\ball\s+fees\b.{0,20}\bare\s+final\b",
                ],
            )?,
        )
        .scoped(&[C::Termination, C::Payment])
        .with_level(P::Vendor, Low)
        .with_level(P::Employer, Low)
        .with_level(P::Employee, Medium)
        .with_guidance(
            "No refund upon early termination",
            "You lose all invested money if the relationship does not work out, even if services are not fully delivered.",
            "Negotiate pro-rata refunds for unused services or time periods.",
            "Add: 'In the event of early termination, fees for services not yet rendered shall be refunded on a pro-rata basis.'",
        ),
        Rule::new(
            "TERM004",
            "Unilateral Termination Right",
            "unilateral_termination",
            High,
            any(
                "TERM004",
                &[
                    r"\b(?:company|employer|service\s+provider)\s+may\s+terminate\b.*\bfor\s+(?:any|no)\s+reason\b",
                    r"\b(?:company|employer|provider)\b.*\bsole\s+discretion\b.*\bterminat",
                ],
            )?,
        )
        .scoped(&[C::Termination])
        .with_guidance(
            "Only one party can terminate without cause",
            "This creates one-sided exit leverage; you have no parallel right.",
            "Require mutual termination rights with notice or limit termination to for-cause only.",
            "Add: 'Either party may terminate for convenience with 90 days notice.'",
        ),
        Rule::new(
            "TERM005",
            "Short Notice Period",
            "short_notice_period",
            Medium,
            Predicate::All(vec![
                any("TERM005", &[r"\bnotice\b"])?,
                Predicate::DurationBelow(ThresholdKey::NoticeDays),
            ]),
        )
        .scoped(&[C::Termination])
        .with_guidance(
            "Notice period is shorter than the expected minimum",
            "A short notice window leaves little time to wind down work, replace the relationship, or recover costs.",
            "Extend the notice period to at least the minimum you need to transition.",
            "Replace the notice period with: 'upon not less than [60] days prior written notice.'",
        ),
        // ---------------------------------------------------------------- Payment
        Rule::new(
            "PAY001",
            "Automatic Renewal",
            "automatic_renewal",
            Medium,
            any(
                "PAY001",
                &[
                    r"\bautomatic\s+renewal\b",
                    r"\bautomatically\s+renew",
                    r"\brenews?\s+automatically\b",
                ],
            )?,
        )
        .scoped(&[C::Payment, C::Termination])
        .with_guidance(
            "Automatic renewal clause",
            "It is easy to miss the cancellation deadline and get locked into another term with financial obligations.",
            "Request opt-in renewal instead, or make sure the cancellation window is clearly tracked.",
            "Replace with: 'This Agreement shall expire at the end of the term unless both parties agree in writing to renew.'",
        ),
        Rule::new(
            "PAY002",
            "Large Upfront Payment",
            "large_upfront_payment",
            Medium,
            any(
                "PAY002",
                &[
                    r"\bpayment\b.{0,40}\bin\s+advance\b.{0,80}\bone\s+year\b",
                    r"\bfull\s+payment\b.{0,20}\bupon\s+execution\b",
                    r"\bentire\s+fee\b.{0,20}\bupfront\b",
                    r"\b(?:100|one\s+hundred)\s*(?:%|percent)\b.{0,40}\b(?:upfront|in\s+advance)\b",
                ],
            )?,
        )
        .scoped(&[C::Payment])
        .with_level(P::Buyer, High)
        .with_level(P::Vendor, Low)
        .with_guidance(
            "Large upfront payment required",
            "There is significant financial risk if the vendor fails to perform or the relationship does not work out.",
            "Negotiate milestone-based payments or monthly/quarterly billing.",
            "Replace with: 'Fees shall be paid quarterly in advance' or 'Fees shall be paid upon completion of defined milestones.'",
        ),
        // ---------------------------------------------------------------- Confidentiality
        Rule::new(
            "CONF001",
            "Perpetual Confidentiality",
            "perpetual_confidentiality",
            High,
            any(
                "CONF001",
                &[
                    r"\bperpetual\b.{0,40}\bconfidentiality\b",
                    r"\bconfidential\w*\b.*\bin\s+perpetuity\b",
                    r"\bconfidential\w*\b.*\bindefinitely\b",
                    r"\bno\s+longer\s+qualifies\s+as\s+a\s+trade\s+secret\b",
                ],
            )?,
        )
        .scoped(&[C::Confidentiality])
        .with_level(P::Disclosing, Low)
        .with_guidance(
            "Perpetual or indefinite confidentiality obligation",
            "This is unreasonably burdensome and may conflict with future obligations. Industry standard is 3-5 years.",
            "Limit the confidentiality term to 3-5 years from disclosure, with exceptions for true trade secrets.",
            "Replace with: 'The confidentiality obligations shall remain in effect for [3-5] years from the date of disclosure, except for information that qualifies as a trade secret under applicable law.'",
        )
        .with_description_for(
            P::Receiving,
            "You are bound forever to keep their secrets, creating indefinite legal obligations.",
        )
        .with_description_for(
            P::Disclosing,
            "Your confidential information is protected indefinitely, which provides strong ongoing protection.",
        ),
        Rule::new(
            "CONF002",
            "Overly Broad Definition",
            "broad_confidentiality_definition",
            High,
            any(
                "CONF002",
                &[
                    r"\ball\b.{0,60}\binformation\b.{0,60}\bconfidential\b",
                    r"\bany\b.{0,40}\binformation\b.{0,40}\bdisclosed\b",
                    r"\ball\s+information\s+or\s+materials?\b",
                ],
            )?,
        )
        .scoped(&[C::Confidentiality])
        .with_level(P::Disclosing, Low)
        .with_guidance(
            "Overly broad definition of confidential information",
            "Everything you see or hear could be deemed confidential, creating impossible compliance burdens.",
            "Ensure clear exclusions for publicly available information, independently developed information, and information received from third parties.",
            "Add: 'Confidential Information does not include information that: (i) is publicly available; (ii) was known prior to disclosure; (iii) is independently developed; or (iv) is received from a third party without breach.'",
        ),
        Rule::new(
            "CONF003",
            "No Confidentiality Sunset",
            "no_confidentiality_sunset",
            Medium,
            without(
                "CONF003",
                r"\bconfidential\b",
                r"\b\d+\)?\s*(?:year|month)s?\b",
                200,
            )?,
        )
        .scoped(&[C::Confidentiality])
        .with_level(P::Disclosing, Low)
        .with_guidance(
            "Confidentiality term lacks explicit duration",
            "Obligations may be read as perpetual, creating an indefinite burden.",
            "Add a 3-5 year confidentiality term with a trade-secret carve-out.",
            "Add: 'for a period of three (3) years from disclosure, except for trade secrets.'",
        ),
        Rule::new(
            "CONF004",
            "Long Confidentiality Term",
            "long_confidentiality_term",
            Medium,
            Predicate::DurationAbove(ThresholdKey::ConfidentialityYears),
        )
        .scoped(&[C::Confidentiality])
        .with_level(P::Disclosing, Low)
        .with_guidance(
            "Confidentiality term is longer than the usual market range",
            "Long-running obligations outlast the commercial value of most information and keep compliance costs running.",
            "Shorten the term to 3-5 years, keeping perpetual protection only for trade secrets.",
            "Replace the term with: 'for a period of [three (3)] years from the date of disclosure.'",
        ),
        // ---------------------------------------------------------------- Intellectual property
        Rule::new(
            "IP001",
            "Complete IP Assignment",
            "complete_ip_assignment",
            High,
            any(
                "IP001",
                &[
                    r"\ball\b.{0,40}\brights\b.{0,40}\bassigned\b",
                    r"\bcompletely\s+assign",
                    r"\bassigns?\b.{0,40}\ball\b.{0,40}\bintellectual\s+property\b",
                    r"\bhereby\s+assigns?\b.{0,60}\ball\s+right",
                ],
            )?,
        )
        .scoped(&[C::IntellectualProperty])
        .with_level(P::Employer, Low)
        .with_level(P::Buyer, Low)
        .with_guidance(
            "Complete intellectual property assignment",
            "You lose all rights to your work and cannot reuse general skills, tools, or methodologies in future projects.",
            "Negotiate to retain rights to pre-existing IP, general skills, and reusable tools or frameworks.",
            "Add: 'This assignment excludes: (i) pre-existing intellectual property; (ii) general skills and knowledge; and (iii) tools and frameworks of general applicability.'",
        )
        .with_description_for(
            P::Employee,
            "You lose all rights to your work and cannot reuse your skills or tools elsewhere.",
        )
        .with_description_for(
            P::Employer,
            "You gain full ownership of all work product created during the engagement.",
        )
        .with_description_for(
            P::Vendor,
            "You cannot reuse your own tools, frameworks, or general methodologies.",
        )
        .with_description_for(
            P::Buyer,
            "You receive full ownership of all deliverables and related IP.",
        ),
        Rule::new(
            "IP002",
            "Work for Hire",
            "work_for_hire",
            Medium,
            any("IP002", &[r"\bwork[\s-]+(?:made\s+)?for[\s-]+hire\b"])?,
        )
        .scoped(&[C::IntellectualProperty])
        .with_level(P::Employer, Low)
        .with_level(P::Buyer, Low)
        .with_guidance(
            "Work-for-hire provision",
            "All work automatically belongs to the other party with no retained rights.",
            "Clarify the scope of work-for-hire and make sure you retain rights to pre-existing materials and general tools.",
            "Add: 'Work for hire applies only to custom deliverables specifically created for this project, excluding pre-existing materials and general-purpose tools.'",
        ),
        // ---------------------------------------------------------------- Non-compete
        Rule::new(
            "NONC001",
            "Broad Non-Compete",
            "broad_non_compete",
            High,
            any(
                "NONC001",
                &[
                    r"\bany\b.{0,40}\bjurisdiction\b",
                    r"\bany\s+(?:capacity|role|industry|business)\b",
                    r"\bnationwide\b",
                    r"\bworldwide\b",
                    r"\banywhere\s+in\s+the\s+world\b",
                ],
            )?,
        )
        .scoped(&[C::NonCompete])
        .with_level(P::Employer, Low)
        .with_guidance(
            "Overly broad non-compete restriction",
            "This significantly limits your future employment and income opportunities.",
            "Negotiate a shorter duration (6-12 months), a narrow geographic scope, and specific industry limitations.",
            "Revise to: 'For [6-12] months following termination, and only within [specific geographic area], Employee shall not compete directly in [specific narrow business line].'",
        )
        .with_description_for(
            P::Employee,
            "This significantly restricts where you can work and earn income after leaving.",
        )
        .with_description_for(
            P::Employer,
            "This protects your business interests from competition by former staff.",
        ),
        Rule::new(
            "NONC002",
            "Long Non-Compete",
            "long_non_compete",
            High,
            Predicate::DurationAbove(ThresholdKey::NonCompeteMonths),
        )
        .scoped(&[C::NonCompete])
        .with_level(P::Employer, Low)
        .with_guidance(
            "Non-compete lasts longer than the accepted maximum",
            "A long restriction materially narrows your post-engagement options; it may be unenforceable but is still burdensome.",
            "Reduce the restriction to 6-12 months, narrow the geography and make it role-specific.",
            "Limit to: '6 months, within a 50-mile radius, in a directly competing role only.'",
        ),
        // ---------------------------------------------------------------- Warranty
        Rule::new(
            "WAR001",
            "No Warranty/As-Is",
            "as_is_warranty",
            Medium,
            any(
                "WAR001",
                &[
                    r"\bno\b.{0,40}\bwarrant(?:y|ies)\b",
                    r"\bas[\s-]+is\b",
                    r"\bdisclaims?\b.{0,40}\ball\b.{0,20}\bwarranties\b",
                ],
            )?,
        )
        .scoped(&[C::Warranty])
        .with_level(P::Buyer, High)
        .with_level(P::Vendor, Low)
        .with_guidance(
            "No warranty or as-is provision",
            "You have no recourse if deliverables are defective, inadequate, or do not work as expected.",
            "Request basic warranties for merchantability, fitness for purpose, and workmanlike performance.",
            "Add: 'Provider warrants that services will be performed in a professional and workmanlike manner and deliverables will conform to specifications for a period of [90] days.'",
        ),
        // ---------------------------------------------------------------- Venue and disputes
        Rule::new(
            "LAW001",
            "Exclusive Home-Court Venue",
            "exclusive_venue",
            Medium,
            any(
                "LAW001",
                &[
                    r"\bexclusive\s+(?:jurisdiction|venue)\b",
                    r"\bsubmit\s+to\s+the\s+exclusive\s+jurisdiction\b",
                ],
            )?,
        )
        .scoped(&[C::GoverningLaw, C::DisputeResolution, C::General])
        .with_guidance(
            "Exclusive venue or jurisdiction favors the counterparty",
            "It increases the cost and risk of litigating away from your home forum.",
            "Negotiate a neutral venue or mutual forum selection.",
            "Replace with: 'non-exclusive jurisdiction' or add a mutual venue clause.",
        ),
        Rule::new(
            "DISP001",
            "No Dispute Resolution Mechanism",
            "no_dispute_mechanism",
            Medium,
            without(
                "DISP001",
                r"\bdisputes?\b",
                r"\b(?:arbitrat\w*|mediat\w*|negotiat\w*)",
                100,
            )?,
        )
        .scoped(&[C::DisputeResolution, C::General])
        .with_guidance(
            "Contract references disputes but lacks a resolution process",
            "It defaults to costly, unmanaged litigation without structured escalation.",
            "Add a negotiation, mediation, then arbitration or venue sequence with timelines.",
            "Add: 'Parties shall first negotiate in good faith for 30 days, then proceed to mediation.'",
        ),
    ])
}
