//! Synthetic-trained statistical classifier.
//!
//! On first use a deterministic synthetic corpus is generated, a TF-IDF
//! vectorizer is fitted over it, and two random forests are trained: one for
//! the diagnosis label, one for the urgency label. The resulting
//! [`ModelBundle`] is built at most once per classifier instance and then
//! shared read-only by every caller.
//!
//! Training needs the `statistical` cargo feature (it pulls in `rand`).
//! Without it, [`StatisticalClassifier::classify`] fails with
//! `TrainingUnavailable`.

pub mod profiles;
pub mod vectorizer;

#[cfg(feature = "statistical")]
pub mod corpus;
#[cfg(feature = "statistical")]
pub mod forest;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};
#[cfg(feature = "statistical")]
use std::sync::OnceLock;

use crate::models::{AnalysisResult, PetContext, Urgency};
use crate::pipeline::error::TriageError;

#[cfg(feature = "statistical")]
use crate::models::{dedup_capped, ModelTag, GENERIC_RECOMMENDATION, MAX_POSSIBLE_CAUSES};
#[cfg(feature = "statistical")]
use crate::pipeline::text::clean_text;

#[cfg(feature = "statistical")]
use self::forest::{ForestParams, RandomForest};
#[cfg(feature = "statistical")]
use self::vectorizer::TfidfVectorizer;

/// Parameters for one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub seed: u64,
    pub n_rows: usize,
    /// Vocabulary bound for the vectorizer.
    pub max_features: usize,
    pub diagnosis_trees: usize,
    pub urgency_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_rows: 1400,
            max_features: 3500,
            diagnosis_trees: 260,
            urgency_trees: 180,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl TrainingConfig {
    /// Same corpus and seed with fewer trees. Used where training time matters
    /// more than ensemble size.
    pub fn with_trees(mut self, diagnosis_trees: usize, urgency_trees: usize) -> Self {
        self.diagnosis_trees = diagnosis_trees;
        self.urgency_trees = urgency_trees;
        self
    }
}

/// Single prediction from the bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub diagnosis: String,
    pub urgency: Urgency,
    /// Highest diagnosis-class probability.
    pub confidence: f32,
}

/// Trained vectorizer plus the two forests. Immutable once built.
#[cfg(feature = "statistical")]
pub struct ModelBundle {
    vectorizer: TfidfVectorizer,
    diagnosis: RandomForest,
    diagnosis_labels: Vec<&'static str>,
    urgency: RandomForest,
    urgency_labels: Vec<Urgency>,
}

#[cfg(feature = "statistical")]
impl ModelBundle {
    pub fn train(config: &TrainingConfig) -> Self {
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

        let start = std::time::Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let rows = corpus::generate_corpus(profiles::SYNTHETIC_PROFILES, config.n_rows, &mut rng);

        let docs: Vec<String> = rows.iter().map(|r| r.text.clone()).collect();
        let vectorizer = TfidfVectorizer::fit(&docs, config.max_features);
        let matrix: Vec<_> = docs.iter().map(|d| vectorizer.transform(d)).collect();
        let n_features = vectorizer.vocabulary_len();

        let mut diagnosis_labels: Vec<&'static str> = rows.iter().map(|r| r.diagnosis).collect();
        diagnosis_labels.sort_unstable();
        diagnosis_labels.dedup();
        let mut urgency_labels: Vec<Urgency> = rows.iter().map(|r| r.urgency).collect();
        urgency_labels.sort_unstable_by_key(|u| u.as_str());
        urgency_labels.dedup();

        let y_diagnosis: Vec<usize> = rows
            .iter()
            .map(|r| diagnosis_labels.iter().position(|l| *l == r.diagnosis).unwrap_or(0))
            .collect();
        let y_urgency: Vec<usize> = rows
            .iter()
            .map(|r| urgency_labels.iter().position(|u| *u == r.urgency).unwrap_or(0))
            .collect();

        let params = |n_trees| ForestParams {
            n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            seed: config.seed,
        };
        let diagnosis = RandomForest::fit(
            &matrix,
            &y_diagnosis,
            n_features,
            diagnosis_labels.len(),
            &params(config.diagnosis_trees),
        );
        let urgency = RandomForest::fit(
            &matrix,
            &y_urgency,
            n_features,
            urgency_labels.len(),
            &params(config.urgency_trees),
        );

        tracing::info!(
            rows = rows.len(),
            vocabulary = n_features,
            diagnosis_classes = diagnosis_labels.len(),
            urgency_classes = urgency_labels.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statistical model bundle trained"
        );

        Self {
            vectorizer,
            diagnosis,
            diagnosis_labels,
            urgency,
            urgency_labels,
        }
    }

    /// Predict for text already passed through `clean_text`.
    pub fn predict(&self, cleaned: &str) -> Option<Prediction> {
        let row = self.vectorizer.transform(cleaned);
        let (d, confidence) = self.diagnosis.predict(&row)?;
        let (u, _) = self.urgency.predict(&row)?;
        Some(Prediction {
            diagnosis: self.diagnosis_labels.get(d)?.to_string(),
            urgency: *self.urgency_labels.get(u)?,
            confidence,
        })
    }
}

/// Lazily trained statistical tier.
pub struct StatisticalClassifier {
    #[cfg_attr(not(feature = "statistical"), allow(dead_code))]
    config: TrainingConfig,
    #[cfg(feature = "statistical")]
    bundle: OnceLock<ModelBundle>,
    training_runs: AtomicUsize,
}

static GLOBAL: LazyLock<Arc<StatisticalClassifier>> =
    LazyLock::new(|| Arc::new(StatisticalClassifier::default()));

impl Default for StatisticalClassifier {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

impl StatisticalClassifier {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "statistical")]
            bundle: OnceLock::new(),
            training_runs: AtomicUsize::new(0),
        }
    }

    /// Process-wide instance with the default training configuration.
    pub fn global() -> Arc<StatisticalClassifier> {
        Arc::clone(&GLOBAL)
    }

    pub fn is_available() -> bool {
        cfg!(feature = "statistical")
    }

    /// How many times training actually ran for this instance (0 or 1).
    pub fn training_runs(&self) -> usize {
        self.training_runs.load(Ordering::SeqCst)
    }

    /// Trained bundle, building it on first call. Concurrent first callers
    /// block on the same build.
    #[cfg(feature = "statistical")]
    pub fn bundle(&self) -> &ModelBundle {
        self.bundle.get_or_init(|| {
            self.training_runs.fetch_add(1, Ordering::SeqCst);
            tracing::info!(
                seed = self.config.seed,
                rows = self.config.n_rows,
                "Training statistical classifier"
            );
            ModelBundle::train(&self.config)
        })
    }

    #[cfg(feature = "statistical")]
    pub fn classify(&self, pet: &PetContext, symptoms: &str) -> Result<AnalysisResult, TriageError> {
        let text = clean_text(&format!("{} age {} {}", pet.species_key(), pet.age, symptoms));
        let prediction = self
            .bundle()
            .predict(&text)
            .ok_or(TriageError::TrainingUnavailable)?;

        let profile = profiles::find_profile(&prediction.diagnosis);
        let (causes, recommendation) = match profile {
            Some(p) => (
                dedup_capped(p.causes.iter().map(|c| c.to_string()), MAX_POSSIBLE_CAUSES),
                p.recommendation.to_string(),
            ),
            None => {
                tracing::warn!(label = %prediction.diagnosis, "Predicted label has no profile");
                (vec!["Unknown".to_string()], GENERIC_RECOMMENDATION.to_string())
            }
        };

        Ok(AnalysisResult {
            diagnosis: vec![prediction.diagnosis],
            urgency_level: prediction.urgency,
            recommendation,
            possible_causes: causes,
            confidence: Some(round3(prediction.confidence)),
            model_used: ModelTag::Statistical,
            ..AnalysisResult::default()
        })
    }

    #[cfg(not(feature = "statistical"))]
    pub fn classify(&self, _pet: &PetContext, _symptoms: &str) -> Result<AnalysisResult, TriageError> {
        Err(TriageError::TrainingUnavailable)
    }
}

#[cfg(feature = "statistical")]
fn round3(value: f32) -> f32 {
    ((value * 1000.0).round() / 1000.0).clamp(0.0, 1.0)
}
