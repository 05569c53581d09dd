//! Red-flag escalation.
//!
//! Fires on the SYMPTOM TEXT, not on any model's output: a red-flag phrase
//! forces High urgency whatever the scorer or remote model concluded.
//! Every scoring tier goes through this one rule table.

use serde::Serialize;

use crate::models::Urgency;

/// Top score at or above which urgency is High even without a red flag.
pub const HIGH_SCORE_THRESHOLD: f32 = 6.5;

/// Top score at or above which urgency is at least Medium.
pub const MEDIUM_SCORE_THRESHOLD: f32 = 3.2;

/// A red-flag rule that matched the symptom text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedFlagHit {
    /// Unique identifier for audit trail.
    pub rule_id: &'static str,
    /// The phrase that matched.
    pub phrase: &'static str,
}

/// A group of phrases that share an escalation reason.
struct RedFlagRule {
    id: &'static str,
    phrases: &'static [&'static str],
}

// ── Phrase sets ─────────────────────────────────────────────
// Phrases are stored already normalized (lowercase, `[a-z0-9 ]`).

static BREATHING_PHRASES: &[&str] = &["not breathing", "breathing hard"];

static NEURO_PHRASES: &[&str] = &["seizure", "unconscious", "collapsed"];

static BLEEDING_PHRASES: &[&str] = &["bloody stool", "blood in vomit"];

static TOXIN_PHRASES: &[&str] = &["poison", "toxin"];

static DISTRESS_PHRASES: &[&str] = &["severe pain", "severe lethargy", "cannot stand"];

static RULES: &[RedFlagRule] = &[
    RedFlagRule { id: "RF-BREATH", phrases: BREATHING_PHRASES },
    RedFlagRule { id: "RF-NEURO", phrases: NEURO_PHRASES },
    RedFlagRule { id: "RF-BLEED", phrases: BLEEDING_PHRASES },
    RedFlagRule { id: "RF-TOXIN", phrases: TOXIN_PHRASES },
    RedFlagRule { id: "RF-DISTRESS", phrases: DISTRESS_PHRASES },
];

// ── Matching logic ──────────────────────────────────────────

/// First red flag contained in the normalized text, in rule order.
pub fn find_red_flag(normalized_text: &str) -> Option<RedFlagHit> {
    RULES.iter().find_map(|rule| {
        rule.phrases
            .iter()
            .find(|p| normalized_text.contains(*p))
            .map(|phrase| RedFlagHit {
                rule_id: rule.id,
                phrase: *phrase,
            })
    })
}

/// Urgency for a scoring tier: red flag or top score >= 6.5 is High,
/// top score >= 3.2 is Medium, anything else Low.
pub fn urgency_for(normalized_text: &str, top_score: f32) -> Urgency {
    if let Some(hit) = find_red_flag(normalized_text) {
        tracing::warn!(
            rule_id = hit.rule_id,
            phrase = hit.phrase,
            top_score,
            "Red-flag escalation fired"
        );
        return Urgency::High;
    }
    if top_score >= HIGH_SCORE_THRESHOLD {
        Urgency::High
    } else if top_score >= MEDIUM_SCORE_THRESHOLD {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

/// Raise an already-decided urgency to High when the text carries a red flag.
/// Emergency is kept; Service Unavailable is never touched.
pub fn apply_red_flags(current: Urgency, normalized_text: &str) -> Urgency {
    if matches!(current, Urgency::Emergency | Urgency::ServiceUnavailable) {
        return current;
    }
    match find_red_flag(normalized_text) {
        Some(hit) => {
            if current != Urgency::High {
                tracing::warn!(
                    rule_id = hit.rule_id,
                    phrase = hit.phrase,
                    from = %current,
                    "Red-flag escalation raised urgency"
                );
            }
            Urgency::High
        }
        None => current,
    }
}
