//! Error taxonomy for the triage tiers.
//!
//! Every variant is recovered inside the orchestrator by advancing to the
//! next tier, except `QuotaExceeded`, which ends the chain.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Remote model unreachable: {0}")]
    UpstreamUnavailable(String),

    #[error("Remote model returned error (status {status}): {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Remote model quota exhausted")]
    QuotaExceeded,

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Remote model API key is not configured")]
    MissingApiKey,

    #[error("Statistical classifier is not available in this build")]
    TrainingUnavailable,

    #[error("No condition profile matched the symptom text")]
    EmptyMatch,
}

impl TriageError {
    /// Terminal errors stop the fallback chain instead of advancing it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::QuotaExceeded)
    }

    /// Transport-level failures (network, timeout, non-success status).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_) | Self::UpstreamStatus { .. } | Self::MissingApiKey
        )
    }

    /// Body was received but could not be turned into the expected schema.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::MalformedResponse(_) | Self::JsonParsing(_))
    }
}
