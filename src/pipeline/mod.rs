pub mod backend;
pub mod classify;
pub mod error;
pub mod explain;
pub mod normalize;
pub mod orchestrator;
pub mod remote;
pub mod safety;
pub mod text;

pub use backend::{AnalysisBackend, PrototypeBackend, RemoteBackend, StatisticalBackend};
pub use error::TriageError;
pub use orchestrator::TriageEngine;
