use serde::{Deserialize, Serialize};

use super::enums::{ModelTag, Urgency};

/// Upper bound on `possible_causes` entries in any result.
pub const MAX_POSSIBLE_CAUSES: usize = 6;

/// Fallback advice for any result that would otherwise carry none.
pub const GENERIC_RECOMMENDATION: &str =
    "Please consult a veterinarian for a full clinical examination.";

/// Canonical triage result. Every backend's output ends up in this shape;
/// every field always carries a well-typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Ordered, deduplicated candidate diagnoses.
    pub diagnosis: Vec<String>,
    pub urgency_level: Urgency,
    pub recommendation: String,
    /// Ordered, deduplicated, at most [`MAX_POSSIBLE_CAUSES`].
    pub possible_causes: Vec<String>,
    pub condition_likelihood: Option<String>,
    /// Raw severity label as reported by a vision backend.
    pub severity: Option<String>,
    /// In [0, 1] when present.
    pub confidence: Option<f32>,
    pub model_used: ModelTag,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            diagnosis: Vec::new(),
            urgency_level: Urgency::Unknown,
            recommendation: String::new(),
            possible_causes: Vec::new(),
            condition_likelihood: None,
            severity: None,
            confidence: None,
            model_used: ModelTag::Unspecified,
        }
    }
}

impl AnalysisResult {
    pub fn tagged(mut self, tag: ModelTag) -> Self {
        self.model_used = tag;
        self
    }

    /// Last-resort result when every tier failed.
    pub fn safe_default() -> Self {
        Self {
            diagnosis: vec!["Veterinary consultation recommended".into()],
            urgency_level: Urgency::Medium,
            recommendation: GENERIC_RECOMMENDATION.into(),
            possible_causes: vec!["Unknown".into()],
            model_used: ModelTag::SafeDefault,
            ..Self::default()
        }
    }

    /// Terminal result for upstream quota exhaustion.
    pub fn quota_exhausted(for_image: bool) -> Self {
        Self {
            diagnosis: vec!["API quota exceeded - please try again later".into()],
            urgency_level: Urgency::ServiceUnavailable,
            recommendation: "The AI service has reached its daily quota. Please try again later or contact support.".into(),
            possible_causes: vec!["API quota limit reached".into()],
            condition_likelihood: for_image.then(|| "Cannot analyze due to quota limit".to_string()),
            model_used: ModelTag::RemoteModel,
            ..Self::default()
        }
    }
}

/// Educational explanation of a diagnosis name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisExplanation {
    pub description: String,
    /// 3 to 5 entries.
    pub causes: Vec<String>,
    /// 3 to 5 entries.
    pub symptoms: Vec<String>,
}

/// Deduplicate preserving first-seen order, keeping at most `cap` entries.
pub fn dedup_capped<I>(items: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if out.len() >= cap {
            break;
        }
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_every_field() {
        let json = serde_json::to_value(AnalysisResult::default()).unwrap();
        for key in [
            "diagnosis",
            "urgency_level",
            "recommendation",
            "possible_causes",
            "condition_likelihood",
            "severity",
            "confidence",
            "model_used",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["urgency_level"], "Unknown");
    }

    #[test]
    fn quota_result_is_service_unavailable() {
        let r = AnalysisResult::quota_exhausted(true);
        assert_eq!(r.urgency_level, Urgency::ServiceUnavailable);
        assert!(r.condition_likelihood.is_some());
        assert!(AnalysisResult::quota_exhausted(false).condition_likelihood.is_none());
    }

    #[test]
    fn safe_default_shape() {
        let r = AnalysisResult::safe_default();
        assert_eq!(r.diagnosis, vec!["Veterinary consultation recommended"]);
        assert_eq!(r.urgency_level, Urgency::Medium);
        assert_eq!(r.model_used, ModelTag::SafeDefault);
    }

    #[test]
    fn dedup_capped_keeps_first_seen_order() {
        let items = ["b", "a", "b", "c", "a", "d"].map(String::from);
        assert_eq!(dedup_capped(items.clone(), 10), vec!["b", "a", "c", "d"]);
        assert_eq!(dedup_capped(items, 2), vec!["b", "a"]);
    }
}
