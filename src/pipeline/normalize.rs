//! Canonical normalizer: coerce any loosely-shaped payload into `AnalysisResult`.
//!
//! Never fails. Wrong types, missing keys and junk entries all fall back to
//! the field's default.

use serde_json::Value;

use crate::models::{dedup_capped, AnalysisResult, Urgency, MAX_POSSIBLE_CAUSES};

/// Diagnosis entries dropped outright (compared case-insensitively).
const PLACEHOLDER_DIAGNOSES: &[&str] = &["unknown", "cannot determine"];

/// A normalized vision payload with the image-verification fields kept apart.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImagePayload {
    pub result: AnalysisResult,
    pub image_match: Option<bool>,
    pub mismatch_reason: Option<String>,
}

/// Normalize a symptom- or image-schema payload.
pub fn normalize(raw: &Value) -> AnalysisResult {
    let Some(obj) = raw.as_object() else {
        tracing::debug!("Payload is not a JSON object; using defaults");
        return AnalysisResult::default();
    };

    let diagnosis = normalize_diagnosis(obj.get("diagnosis"));

    let mut urgency_level = obj
        .get("urgency_level")
        .and_then(Value::as_str)
        .map(Urgency::parse_lenient)
        .unwrap_or_default();

    let severity = non_empty_str(obj.get("severity"));
    if let Some(sev) = &severity {
        let parsed = Urgency::from_severity(sev);
        if parsed != Urgency::Unknown {
            urgency_level = parsed;
        }
    }

    AnalysisResult {
        diagnosis,
        urgency_level,
        recommendation: non_empty_str(obj.get("recommendation")).unwrap_or_default(),
        possible_causes: normalize_causes(obj.get("possible_causes")),
        condition_likelihood: non_empty_str(obj.get("condition_likelihood")),
        severity,
        confidence: obj
            .get("confidence")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0) as f32),
        ..AnalysisResult::default()
    }
}

/// Normalize an image-schema payload, keeping `image_match`/`mismatch_reason`.
/// A payload that says the image does not match and gives no usable urgency
/// is reported as Not Assessed.
pub fn normalize_image(raw: &Value) -> NormalizedImagePayload {
    let mut result = normalize(raw);
    let image_match = raw.get("image_match").and_then(|v| match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    });
    let mismatch_reason = non_empty_str(raw.get("mismatch_reason"));

    if image_match == Some(false) && result.urgency_level == Urgency::Unknown {
        result.urgency_level = Urgency::NotAssessed;
    }

    NormalizedImagePayload {
        result,
        image_match,
        mismatch_reason,
    }
}

fn normalize_diagnosis(value: Option<&Value>) -> Vec<String> {
    let entries: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
            scalar_to_string(v).into_iter().collect()
        }
        _ => Vec::new(),
    };

    let kept = entries.into_iter().filter(|d| {
        !d.is_empty()
            && !PLACEHOLDER_DIAGNOSES
                .iter()
                .any(|p| d.eq_ignore_ascii_case(p))
    });
    dedup_capped(kept, usize::MAX)
}

fn normalize_causes(value: Option<&Value>) -> Vec<String> {
    let entries: Vec<String> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
        Some(v @ Value::String(_)) => scalar_to_string(v).into_iter().collect(),
        _ => Vec::new(),
    };
    dedup_capped(
        entries.into_iter().filter(|c| !c.is_empty()),
        MAX_POSSIBLE_CAUSES,
    )
}

/// Trimmed string form of a scalar; `None` for null, arrays and objects.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
