//! Polymorphic analysis tiers.
//!
//! Every strategy the orchestrator can try implements [`AnalysisBackend`];
//! an `Err` means "advance to the next tier" unless the error is terminal.

use std::sync::Arc;

use crate::config;
use crate::models::{
    AnalysisRequest, AnalysisResult, ModelTag, PetContext, GENERIC_RECOMMENDATION,
};
use crate::pipeline::classify::{PrototypeClassifier, StatisticalClassifier};
use crate::pipeline::error::TriageError;
use crate::pipeline::normalize::{normalize, normalize_image};
use crate::pipeline::remote::{
    build_image_prompt, build_symptom_prompt, parse_image_reply, parse_symptom_reply,
    GenerativeModel,
};
use crate::pipeline::safety::apply_mismatch_warning;

pub trait AnalysisBackend: Send + Sync {
    /// Tag stamped on results this tier produces.
    fn tag(&self) -> ModelTag;

    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, TriageError>;
}

/// Remote generative model tier.
pub struct RemoteBackend {
    model: Arc<dyn GenerativeModel>,
}

impl RemoteBackend {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    fn analyze_symptoms(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, TriageError> {
        let prompt = build_symptom_prompt(request.pet(), request.text());
        let text = self.model.generate_json(&prompt, None, config::symptom_timeout())?;
        let mut result = normalize(&parse_symptom_reply(&text)?);

        if result.diagnosis.is_empty() {
            return Err(TriageError::MalformedResponse(
                "No usable diagnosis in model reply".into(),
            ));
        }
        if result.recommendation.is_empty() {
            result.recommendation = GENERIC_RECOMMENDATION.to_string();
        }
        Ok(result)
    }

    fn analyze_image(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, TriageError> {
        let AnalysisRequest::Image { pet, image, description } = request else {
            return self.analyze_symptoms(request);
        };

        let prompt = build_image_prompt(pet, description);
        let text = self
            .model
            .generate_json(&prompt, Some(*image), config::image_timeout())?;
        let payload = normalize_image(&parse_image_reply(&text)?);

        let mut result = payload.result;
        apply_mismatch_warning(&mut result, payload.mismatch_reason.as_deref());

        // An empty diagnosis is only acceptable when the model declined to
        // assess a mismatched image.
        if result.diagnosis.is_empty() && payload.image_match != Some(false) {
            return Err(TriageError::MalformedResponse(
                "No usable diagnosis in image reply".into(),
            ));
        }
        if payload.image_match == Some(false) {
            tracing::info!(
                reason = payload.mismatch_reason.as_deref().unwrap_or(""),
                "Image not assessed: does not match pet profile"
            );
            if result.recommendation.is_empty() {
                result.recommendation =
                    not_assessed_recommendation(pet, payload.mismatch_reason.as_deref());
            }
        }
        if result.recommendation.is_empty() {
            result.recommendation = GENERIC_RECOMMENDATION.to_string();
        }
        Ok(result)
    }
}

/// Advice for a photo the vision model refused to assess.
fn not_assessed_recommendation(pet: &PetContext, reason: Option<&str>) -> String {
    let ask = format!(
        "Please upload a clear photo of {} that shows the affected area.",
        pet.name
    );
    match reason.map(|r| r.trim().trim_end_matches('.')).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{reason}. {ask}"),
        None => ask,
    }
}

impl AnalysisBackend for RemoteBackend {
    fn tag(&self) -> ModelTag {
        ModelTag::RemoteModel
    }

    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, TriageError> {
        let result = if request.is_image() {
            self.analyze_image(request)?
        } else {
            self.analyze_symptoms(request)?
        };
        Ok(result.tagged(self.tag()))
    }
}

/// Keyword-prototype tier.
#[derive(Default)]
pub struct PrototypeBackend {
    classifier: PrototypeClassifier,
}

impl PrototypeBackend {
    pub fn new(classifier: PrototypeClassifier) -> Self {
        Self { classifier }
    }
}

impl AnalysisBackend for PrototypeBackend {
    fn tag(&self) -> ModelTag {
        ModelTag::Prototype
    }

    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, TriageError> {
        self.classifier.try_score(request.pet(), request.text())
    }
}

/// Synthetic-trained statistical tier.
pub struct StatisticalBackend {
    classifier: Arc<StatisticalClassifier>,
}

impl StatisticalBackend {
    pub fn new(classifier: Arc<StatisticalClassifier>) -> Self {
        Self { classifier }
    }
}

impl Default for StatisticalBackend {
    fn default() -> Self {
        Self::new(StatisticalClassifier::global())
    }
}

impl AnalysisBackend for StatisticalBackend {
    fn tag(&self) -> ModelTag {
        ModelTag::Statistical
    }

    /// Blank text carries no signal, only species and age; it is not classified.
    fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult, TriageError> {
        if request.text().trim().is_empty() {
            return Err(TriageError::EmptyMatch);
        }
        self.classifier.classify(request.pet(), request.text())
    }
}
