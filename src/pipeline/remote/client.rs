use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::RemoteConfig;
use crate::models::InlineImage;
use crate::pipeline::error::TriageError;

/// A generative model that answers a prompt (plus optional image) with
/// JSON text.
pub trait GenerativeModel: Send + Sync {
    /// Returns the model's reply text, which is expected to be a JSON object.
    fn generate_json(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
        timeout: Duration,
    ) -> Result<String, TriageError>;
}

/// Gemini `generateContent` client over blocking HTTP.
pub struct GeminiClient {
    api_base: String,
    api_key: String,
    models: Vec<String>,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(api_base: &str, api_key: &str, models: Vec<String>) -> Result<Self, TriageError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| TriageError::UpstreamUnavailable(e.to_string()))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            models,
            client,
        })
    }

    /// `MissingApiKey` when no key is configured.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, TriageError> {
        let key = config.api_key.as_deref().ok_or(TriageError::MissingApiKey)?;
        Self::new(&config.api_base, key, config.models.clone())
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    fn call_model(
        &self,
        model: &str,
        body: &GenerateRequest<'_>,
        timeout: Duration,
    ) -> Result<String, TriageError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .timeout(timeout)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TriageError::UpstreamUnavailable(format!(
                        "Request timed out after {}s",
                        timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    TriageError::UpstreamUnavailable(format!("Cannot connect to {}", self.api_base))
                } else {
                    TriageError::UpstreamUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(TriageError::QuotaExceeded);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TriageError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| TriageError::MalformedResponse(e.to_string()))?;

        parsed.reply_text()
    }
}

/// Request body for `models/{model}:generateContent`.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Inline { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    response_mime_type: &'static str,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str, image: Option<&'a InlineImage>) -> Self {
        let mut parts = Vec::with_capacity(2);
        if let Some(img) = image {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: &img.mime_type,
                    data: base64::engine::general_purpose::STANDARD.encode(&img.data),
                },
            });
        }
        parts.push(Part::Text { text: prompt });

        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        }
    }
}

/// Response body from `generateContent`. Only the first candidate's first
/// text part is used.
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

impl GenerateResponse {
    fn reply_text(self) -> Result<String, TriageError> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| TriageError::MalformedResponse("No candidate text in response".into()))
    }
}

impl GenerativeModel for GeminiClient {
    /// Tries each configured model in order. Only a 404 (model not served)
    /// moves on to the next model; every other failure is returned as-is.
    fn generate_json(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
        timeout: Duration,
    ) -> Result<String, TriageError> {
        let body = GenerateRequest::new(prompt, image);
        let mut last_error = TriageError::UpstreamUnavailable("No remote model configured".into());

        for model in &self.models {
            match self.call_model(model, &body, timeout) {
                Ok(text) => return Ok(text),
                Err(TriageError::UpstreamStatus { status: 404, body }) => {
                    tracing::warn!(model = %model, "Remote model not found, trying next");
                    last_error = TriageError::UpstreamStatus { status: 404, body };
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

/// Scripted outcome for [`MockGenerativeModel`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Quota,
    Unavailable,
    Status(u16),
}

/// Mock generative model for testing: returns a configured reply and counts calls.
pub struct MockGenerativeModel {
    reply: MockReply,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerativeModel {
    pub fn new(reply: &str) -> Self {
        Self::with_reply(MockReply::Text(reply.to_string()))
    }

    pub fn quota_exceeded() -> Self {
        Self::with_reply(MockReply::Quota)
    }

    pub fn unavailable() -> Self {
        Self::with_reply(MockReply::Unavailable)
    }

    pub fn with_reply(reply: MockReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl GenerativeModel for MockGenerativeModel {
    fn generate_json(
        &self,
        prompt: &str,
        _image: Option<&InlineImage>,
        _timeout: Duration,
    ) -> Result<String, TriageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Quota => Err(TriageError::QuotaExceeded),
            MockReply::Unavailable => Err(TriageError::UpstreamUnavailable("mock offline".into())),
            MockReply::Status(status) => Err(TriageError::UpstreamStatus {
                status: *status,
                body: String::new(),
            }),
        }
    }
}
