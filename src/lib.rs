//! Pet symptom triage engine.
//!
//! Turns a free-text symptom report, or a photo plus description, into a
//! canonical [`models::AnalysisResult`]. A remote generative model is tried
//! first, then a keyword-prototype scorer, then a classifier trained on a
//! synthetic corpus, and finally a fixed safe default. See
//! [`pipeline::TriageEngine`].

pub mod config;
pub mod models;
pub mod pipeline;

pub use models::{AnalysisResult, DiagnosisExplanation, ModelTag, PetContext, Urgency};
pub use pipeline::{TriageEngine, TriageError};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. The filter comes from `PETTRIAGE_LOG`,
/// then `RUST_LOG`, then [`config::default_log_filter`]. Safe to call more
/// than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(config::LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::info!("{} v{} tracing initialized", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn end_to_end_local_triage() {
        let engine = TriageEngine::new(vec![Box::new(pipeline::PrototypeBackend::default())]);
        let pet = PetContext::new("Rex", "dog", "Labrador", 5);
        let r = engine.analyze_symptoms(&pet, "dog vomiting and diarrhea since morning");
        assert_eq!(r.diagnosis[0], "Gastrointestinal upset");
        assert_eq!(r.urgency_level, Urgency::Medium);
        assert_eq!(r.model_used, ModelTag::Prototype);
    }
}
