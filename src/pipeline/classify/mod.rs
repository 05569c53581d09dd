//! Local classifiers: the keyword-prototype scorer and the
//! synthetic-trained statistical classifier.

pub mod prototype;
pub mod statistical;

pub use prototype::{non_specific_result, ConditionProfile, PrototypeClassifier, CONDITION_PROFILES};
pub use statistical::{StatisticalClassifier, TrainingConfig};
