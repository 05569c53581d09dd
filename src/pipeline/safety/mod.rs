pub mod escalation;
pub mod mismatch;

pub use escalation::*;
pub use mismatch::*;
