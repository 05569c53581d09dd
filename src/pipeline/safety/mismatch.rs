//! Image/profile mismatch heuristic.
//!
//! Vision models are asked to flag when the photo does not match the
//! selected pet. They phrase this inconsistently, so the raw diagnosis text
//! is scanned for mismatch phrases and, on a hit, one canonical warning is
//! prepended to the diagnosis list.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::AnalysisResult;

/// Mismatch classes, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MismatchKind {
    Species,
    Breed,
    Age,
}

struct MismatchRule {
    kind: MismatchKind,
    /// Matched against ` <joined lowercase text> ` so a leading space anchors a word start.
    phrases: &'static [&'static str],
    /// Whole word that signals this class when it appears with any [`MISMATCH_MARKERS`] entry.
    subject: Option<&'static str>,
    pattern: Option<&'static LazyLock<Regex>>,
    warning: &'static str,
}

static MISMATCH_MARKERS: &[&str] = &[
    "mismatch",
    "does not match",
    "doesn't match",
    "do not match",
    "don't match",
];

/// "not a dog", "isn't a cat" and similar.
static NEGATED_SPECIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:not|isn'?t) an? (?:dog|cat|puppy|kitten|canine|feline|rabbit|bird)s?\b")
        .expect("valid regex")
});

static SPECIES_PHRASES: &[&str] = &[
    "species mismatch",
    "different species",
    "wrong species",
    "species does not match",
    "species doesn't match",
    "not the same species",
];

static BREED_PHRASES: &[&str] = &[
    "breed mismatch",
    "different breed",
    "breed does not match",
    "breed doesn't match",
    "breed appears inconsistent",
    "breed inconsistent",
];

// Leading space keeps "image mismatch" from reading as an age mismatch.
static AGE_PHRASES: &[&str] = &[
    " age mismatch",
    " age does not match",
    " age doesn't match",
    " age appears inconsistent",
    " age inconsistent",
    " different age",
];

static RULES: &[MismatchRule] = &[
    MismatchRule {
        kind: MismatchKind::Species,
        phrases: SPECIES_PHRASES,
        subject: None,
        pattern: Some(&NEGATED_SPECIES),
        warning: "\u{26a0} The uploaded image does not appear to match your pet's species.",
    },
    MismatchRule {
        kind: MismatchKind::Breed,
        phrases: BREED_PHRASES,
        subject: Some("breed"),
        pattern: None,
        warning: "\u{26a0} The breed characteristics in the image don't match your pet's profile.",
    },
    MismatchRule {
        kind: MismatchKind::Age,
        phrases: AGE_PHRASES,
        subject: Some("age"),
        pattern: None,
        warning: "\u{26a0} The apparent age in the image doesn't align with your pet's profile.",
    },
];

impl MismatchRule {
    fn matches(&self, haystack: &str) -> bool {
        self.phrases.iter().any(|p| haystack.contains(p))
            || self.pattern.is_some_and(|re| re.is_match(haystack))
            || self.subject.is_some_and(|word| {
                has_word(haystack, word) && MISMATCH_MARKERS.iter().any(|m| haystack.contains(m))
            })
    }
}

fn has_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

impl MismatchKind {
    /// Canonical warning entry for this class.
    pub fn warning(&self) -> &'static str {
        RULES
            .iter()
            .find(|r| r.kind == *self)
            .map(|r| r.warning)
            .unwrap_or_default()
    }
}

/// First mismatch class found in the diagnosis entries plus any extra
/// free text (the vision model's `mismatch_reason`).
pub fn detect_mismatch(diagnosis: &[String], extra: Option<&str>) -> Option<MismatchKind> {
    let mut joined = diagnosis.join(" ");
    if let Some(extra) = extra {
        joined.push(' ');
        joined.push_str(extra);
    }
    let haystack = format!(" {} ", joined.to_lowercase());

    RULES
        .iter()
        .find(|rule| rule.matches(&haystack))
        .map(|rule| rule.kind)
}

/// Prepend at most one mismatch warning to `result.diagnosis`.
/// Returns the detected class, whether or not a new entry was inserted.
pub fn apply_mismatch_warning(
    result: &mut AnalysisResult,
    extra: Option<&str>,
) -> Option<MismatchKind> {
    let kind = detect_mismatch(&result.diagnosis, extra)?;
    let warning = kind.warning();
    if !result.diagnosis.iter().any(|d| d == warning) {
        tracing::info!(kind = ?kind, "Image mismatch warning injected");
        result.diagnosis.insert(0, warning.to_string());
    }
    Some(kind)
}
