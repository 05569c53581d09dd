use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "pettriage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter (falls back to `RUST_LOG`).
pub const LOG_ENV_VAR: &str = "PETTRIAGE_LOG";

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const GEMINI_MODEL_VAR: &str = "GEMINI_MODEL";
pub const GEMINI_API_BASE_VAR: &str = "GEMINI_API_BASE";

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Remote models tried in order when the configured one is not found.
pub const DEFAULT_MODELS: &[&str] = &["gemini-1.5-flash", "gemini-2.0-flash", "gemini-2.5-flash"];

pub const SYMPTOM_TIMEOUT_SECS: u64 = 30;
pub const IMAGE_TIMEOUT_SECS: u64 = 60;
pub const EXPLAIN_TIMEOUT_SECS: u64 = 30;

/// Default tracing filter when neither `PETTRIAGE_LOG` nor `RUST_LOG` is set.
pub fn default_log_filter() -> &'static str {
    "pettriage=info"
}

pub fn symptom_timeout() -> Duration {
    Duration::from_secs(SYMPTOM_TIMEOUT_SECS)
}

pub fn image_timeout() -> Duration {
    Duration::from_secs(IMAGE_TIMEOUT_SECS)
}

pub fn explain_timeout() -> Duration {
    Duration::from_secs(EXPLAIN_TIMEOUT_SECS)
}

/// Settings for the remote generative model tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// `None` disables the remote tier.
    pub api_key: Option<String>,
    pub api_base: String,
    /// Preference order; an explicit `GEMINI_MODEL` goes first.
    pub models: Vec<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl RemoteConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base = get(GEMINI_API_BASE_VAR)
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            api_key: get(GEMINI_API_KEY_VAR),
            api_base,
            models: preferred_models(get(GEMINI_MODEL_VAR).as_deref()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Model preference list with an optional override placed first.
pub fn preferred_models(override_model: Option<&str>) -> Vec<String> {
    let mut models: Vec<String> = Vec::with_capacity(DEFAULT_MODELS.len() + 1);
    if let Some(m) = override_model {
        models.push(m.to_string());
    }
    for m in DEFAULT_MODELS {
        if !models.iter().any(|existing| existing == m) {
            models.push(m.to_string());
        }
    }
    models
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_disables_remote() {
        let cfg = RemoteConfig::from_lookup(lookup(&[]));
        assert!(!cfg.is_enabled());
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.models[0], "gemini-1.5-flash");
    }

    #[test]
    fn blank_key_counts_as_unset() {
        let cfg = RemoteConfig::from_lookup(lookup(&[(GEMINI_API_KEY_VAR, "   ")]));
        assert!(!cfg.is_enabled());
    }

    #[test]
    fn model_override_goes_first_without_duplicates() {
        let cfg = RemoteConfig::from_lookup(lookup(&[
            (GEMINI_API_KEY_VAR, "k"),
            (GEMINI_MODEL_VAR, "gemini-2.0-flash"),
        ]));
        assert_eq!(cfg.models[0], "gemini-2.0-flash");
        assert_eq!(cfg.models.len(), DEFAULT_MODELS.len());
        assert_eq!(cfg.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn unknown_override_is_prepended() {
        let models = preferred_models(Some("gemini-exp"));
        assert_eq!(models[0], "gemini-exp");
        assert_eq!(models.len(), DEFAULT_MODELS.len() + 1);
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let cfg = RemoteConfig::from_lookup(lookup(&[(GEMINI_API_BASE_VAR, "http://localhost:8080/")]));
        assert_eq!(cfg.api_base, "http://localhost:8080");
    }

    #[test]
    fn timeouts() {
        assert_eq!(symptom_timeout(), Duration::from_secs(30));
        assert_eq!(image_timeout(), Duration::from_secs(60));
        assert_eq!(explain_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
