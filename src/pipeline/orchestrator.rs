//! Fallback orchestrator.
//!
//! Tries each tier in order and returns the first success, post-processed
//! with red-flag escalation. Quota exhaustion ends the chain with a
//! dedicated result; every other tier failure advances to the next tier.
//! If all tiers fail the caller gets the safe default. Nothing here returns
//! an error.

use std::sync::Arc;

use crate::config::RemoteConfig;
use crate::models::{AnalysisRequest, AnalysisResult, DiagnosisExplanation, InlineImage, ModelTag, PetContext};
use crate::pipeline::backend::{AnalysisBackend, PrototypeBackend, RemoteBackend, StatisticalBackend};
use crate::pipeline::explain;
use crate::pipeline::remote::{GeminiClient, GenerativeModel};
use crate::pipeline::safety::apply_red_flags;
use crate::pipeline::text::normalize_text;

pub struct TriageEngine {
    tiers: Vec<Box<dyn AnalysisBackend>>,
    explainer: Option<Arc<dyn GenerativeModel>>,
}

impl TriageEngine {
    /// Engine over an explicit tier list, tried in the given order.
    pub fn new(tiers: Vec<Box<dyn AnalysisBackend>>) -> Self {
        Self {
            tiers,
            explainer: None,
        }
    }

    /// Prototype then statistical tier.
    pub fn local_only() -> Self {
        Self::new(vec![
            Box::new(PrototypeBackend::default()),
            Box::new(StatisticalBackend::default()),
        ])
    }

    /// Remote, prototype, statistical. The remote model also serves explanations.
    pub fn with_remote(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            tiers: vec![
                Box::new(RemoteBackend::new(Arc::clone(&model))),
                Box::new(PrototypeBackend::default()),
                Box::new(StatisticalBackend::default()),
            ],
            explainer: Some(model),
        }
    }

    pub fn with_explainer(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.explainer = Some(model);
        self
    }

    /// Build from `GEMINI_*` environment variables. Without an API key the
    /// remote tier is left out.
    pub fn from_env() -> Self {
        Self::from_config(&RemoteConfig::from_env())
    }

    pub fn from_config(config: &RemoteConfig) -> Self {
        match GeminiClient::from_config(config) {
            Ok(client) => {
                tracing::info!(models = ?config.models, "Remote model tier enabled");
                Self::with_remote(Arc::new(client))
            }
            Err(e) => {
                tracing::info!(reason = %e, "Remote model tier disabled");
                Self::local_only()
            }
        }
    }

    /// Tags of the configured tiers, in attempt order.
    pub fn tier_tags(&self) -> Vec<ModelTag> {
        self.tiers.iter().map(|t| t.tag()).collect()
    }

    pub fn analyze_symptoms(&self, pet: &PetContext, symptoms: &str) -> AnalysisResult {
        self.analyze(&AnalysisRequest::Symptoms { pet, symptoms })
    }

    pub fn analyze_image(
        &self,
        pet: &PetContext,
        image_bytes: &[u8],
        mime_type: &str,
        description: &str,
    ) -> AnalysisResult {
        let image = InlineImage::new(image_bytes.to_vec(), mime_type);
        self.analyze(&AnalysisRequest::Image {
            pet,
            image: &image,
            description,
        })
    }

    pub fn explain_diagnosis(&self, name: &str) -> DiagnosisExplanation {
        explain::explain_diagnosis(self.explainer.as_deref(), name)
    }

    pub fn analyze(&self, request: &AnalysisRequest<'_>) -> AnalysisResult {
        let kind = if request.is_image() { "image" } else { "symptoms" };
        let _span = tracing::info_span!("triage", kind, species = %request.pet().species).entered();

        for tier in &self.tiers {
            let tag = tier.tag();
            match tier.analyze(request) {
                Ok(mut result) => {
                    if result.model_used == ModelTag::Unspecified {
                        result.model_used = tag;
                    }
                    self.post_process(&mut result, request);
                    tracing::info!(
                        tier = %tag,
                        urgency = %result.urgency_level,
                        diagnoses = result.diagnosis.len(),
                        "Triage complete"
                    );
                    return result;
                }
                Err(e) if e.is_terminal() => {
                    tracing::warn!(tier = %tag, error = %e, "Quota exhausted, not falling back");
                    return AnalysisResult::quota_exhausted(request.is_image());
                }
                Err(e) => {
                    tracing::warn!(tier = %tag, error = %e, "Tier failed, falling back");
                }
            }
        }

        tracing::warn!("All tiers failed, returning safe default");
        let mut result = AnalysisResult::safe_default();
        self.post_process(&mut result, request);
        result
    }

    fn post_process(&self, result: &mut AnalysisResult, request: &AnalysisRequest<'_>) {
        let text = normalize_text(request.text());
        result.urgency_level = apply_red_flags(result.urgency_level, &text);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::models::Urgency;
    use crate::pipeline::classify::{StatisticalClassifier, TrainingConfig};
    use crate::pipeline::error::TriageError;
    use crate::pipeline::remote::MockGenerativeModel;

    /// Tier that counts calls and always fails (or succeeds) the same way.
    struct CountingTier {
        tag: ModelTag,
        calls: Arc<AtomicUsize>,
        outcome: fn() -> Result<AnalysisResult, TriageError>,
    }

    impl AnalysisBackend for CountingTier {
        fn tag(&self) -> ModelTag {
            self.tag
        }

        fn analyze(&self, _request: &AnalysisRequest<'_>) -> Result<AnalysisResult, TriageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn counting(
        tag: ModelTag,
        outcome: fn() -> Result<AnalysisResult, TriageError>,
    ) -> (Box<dyn AnalysisBackend>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let tier = CountingTier {
            tag,
            calls: Arc::clone(&calls),
            outcome,
        };
        (Box::new(tier), calls)
    }

    fn dog() -> PetContext {
        PetContext::new("Rex", "dog", "Labrador", 5)
    }

    fn quick_statistical() -> Arc<StatisticalClassifier> {
        Arc::new(StatisticalClassifier::new(TrainingConfig::default().with_trees(16, 12)))
    }

    #[test]
    fn quota_is_terminal() {
        let remote = Arc::new(MockGenerativeModel::quota_exceeded());
        let (proto, proto_calls) = counting(ModelTag::Prototype, || Err(TriageError::EmptyMatch));
        let (stat, stat_calls) = counting(ModelTag::Statistical, || Err(TriageError::TrainingUnavailable));
        let engine = TriageEngine::new(vec![Box::new(RemoteBackend::new(remote.clone())), proto, stat]);

        let r = engine.analyze_symptoms(&dog(), "vomiting");
        assert_eq!(r.urgency_level, Urgency::ServiceUnavailable);
        assert_eq!(r.diagnosis, vec!["API quota exceeded - please try again later"]);
        assert_eq!(r.condition_likelihood, None);
        assert_eq!(remote.calls(), 1);
        assert_eq!(proto_calls.load(Ordering::SeqCst), 0);
        assert_eq!(stat_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn quota_on_image_sets_likelihood() {
        let engine = TriageEngine::new(vec![Box::new(RemoteBackend::new(Arc::new(
            MockGenerativeModel::quota_exceeded(),
        )))]);
        let r = engine.analyze_image(&dog(), &[1, 2, 3], "image/png", "");
        assert_eq!(r.urgency_level, Urgency::ServiceUnavailable);
        assert_eq!(r.condition_likelihood.as_deref(), Some("Cannot analyze due to quota limit"));
    }

    #[test]
    fn quota_result_is_not_escalated() {
        let engine = TriageEngine::new(vec![Box::new(RemoteBackend::new(Arc::new(
            MockGenerativeModel::quota_exceeded(),
        )))]);
        let r = engine.analyze_symptoms(&dog(), "seizure");
        assert_eq!(r.urgency_level, Urgency::ServiceUnavailable);
    }

    #[test]
    fn remote_failure_falls_to_prototype() {
        let engine = TriageEngine::new(vec![
            Box::new(RemoteBackend::new(Arc::new(MockGenerativeModel::unavailable()))),
            Box::new(PrototypeBackend::default()),
        ]);
        let r = engine.analyze_symptoms(&dog(), "dog vomiting and diarrhea since morning");
        assert_eq!(r.model_used, ModelTag::Prototype);
        assert_eq!(r.diagnosis[0], "Gastrointestinal upset");
        assert_eq!(r.urgency_level, Urgency::Medium);
    }

    #[test]
    fn malformed_remote_reply_falls_back() {
        let engine = TriageEngine::new(vec![
            Box::new(RemoteBackend::new(Arc::new(MockGenerativeModel::new("<html>oops</html>")))),
            Box::new(PrototypeBackend::default()),
        ]);
        let r = engine.analyze_symptoms(&dog(), "limp on back leg");
        assert_eq!(r.model_used, ModelTag::Prototype);
        assert_eq!(r.diagnosis[0], "Musculoskeletal pain/injury");
    }

    #[test]
    fn remote_success_is_tagged_and_escalated() {
        let engine = TriageEngine::with_remote(Arc::new(MockGenerativeModel::new(
            r#"{"diagnosis": ["Epilepsy"], "urgency_level": "Medium", "recommendation": "See a vet.", "possible_causes": ["Idiopathic"]}"#,
        )));
        let r = engine.analyze_symptoms(&dog(), "had a seizure this morning");
        assert_eq!(r.model_used, ModelTag::RemoteModel);
        assert_eq!(r.urgency_level, Urgency::High);
    }

    #[test]
    fn empty_match_advances_to_statistical() {
        let engine = TriageEngine::new(vec![
            Box::new(PrototypeBackend::default()),
            Box::new(StatisticalBackend::new(quick_statistical())),
        ]);
        let r = engine.analyze_symptoms(&dog(), "xyzzy");
        if StatisticalClassifier::is_available() {
            assert_eq!(r.model_used, ModelTag::Statistical);
            assert_eq!(r.diagnosis.len(), 1);
        } else {
            assert_eq!(r.model_used, ModelTag::SafeDefault);
        }
    }

    #[test]
    fn all_tiers_failing_gives_safe_default() {
        let (a, a_calls) = counting(ModelTag::RemoteModel, || {
            Err(TriageError::UpstreamUnavailable("down".into()))
        });
        let (b, b_calls) = counting(ModelTag::Prototype, || Err(TriageError::EmptyMatch));
        let engine = TriageEngine::new(vec![a, b]);
        let r = engine.analyze_symptoms(&dog(), "xyzzy");
        assert_eq!(r, AnalysisResult::safe_default());
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn safe_default_still_escalates_red_flags() {
        let engine = TriageEngine::new(Vec::new());
        let r = engine.analyze_symptoms(&dog(), "my dog is not breathing");
        assert_eq!(r.model_used, ModelTag::SafeDefault);
        assert_eq!(r.urgency_level, Urgency::High);
    }

    #[test]
    fn untagged_success_gets_tier_tag() {
        let (tier, _) = counting(ModelTag::Statistical, || {
            Ok(AnalysisResult {
                diagnosis: vec!["X".into()],
                urgency_level: Urgency::Low,
                ..AnalysisResult::default()
            })
        });
        let r = TriageEngine::new(vec![tier]).analyze_symptoms(&dog(), "x");
        assert_eq!(r.model_used, ModelTag::Statistical);
    }

    #[test]
    fn image_with_blank_description_and_no_remote_is_safe_default() {
        let engine = TriageEngine::new(vec![
            Box::new(PrototypeBackend::default()),
            Box::new(StatisticalBackend::new(quick_statistical())),
        ]);
        let r = engine.analyze_image(&dog(), &[0xff, 0xd8], "image/jpeg", "");
        assert_eq!(r.model_used, ModelTag::SafeDefault);
    }

    #[test]
    fn image_mismatch_reaches_caller_once() {
        let engine = TriageEngine::with_remote(Arc::new(MockGenerativeModel::new(
            r#"{"diagnosis": ["Species mismatch", "species mismatch again", "Alopecia"], "urgency_level": "Low"}"#,
        )));
        let r = engine.analyze_image(&dog(), &[1], "image/jpeg", "");
        let warnings = r.diagnosis.iter().filter(|d| d.starts_with('\u{26a0}')).count();
        assert_eq!(warnings, 1);
        assert!(r.diagnosis[0].starts_with('\u{26a0}'));
    }

    #[test]
    fn explanation_without_remote_uses_table() {
        let e = TriageEngine::new(Vec::new()).explain_diagnosis("Ringworm");
        assert!(e.description.contains("fungal infection"));
    }

    #[test]
    fn from_config_without_key_is_local() {
        let engine = TriageEngine::from_config(&RemoteConfig::default());
        assert_eq!(engine.tier_tags(), vec![ModelTag::Prototype, ModelTag::Statistical]);
    }

    #[test]
    fn from_config_with_key_puts_remote_first() {
        let cfg = RemoteConfig {
            api_key: Some("test-key".into()),
            ..RemoteConfig::default()
        };
        let engine = TriageEngine::from_config(&cfg);
        assert_eq!(
            engine.tier_tags(),
            vec![ModelTag::RemoteModel, ModelTag::Prototype, ModelTag::Statistical]
        );
    }
}
