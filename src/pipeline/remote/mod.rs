//! Remote generative-model tier: HTTP client, prompts and reply parsing.

pub mod client;
pub mod parser;
pub mod prompt;

pub use client::{GeminiClient, GenerativeModel, MockGenerativeModel, MockReply};
pub use parser::{parse_image_reply, parse_reply, parse_symptom_reply};
pub use prompt::{build_explain_prompt, build_image_prompt, build_symptom_prompt};
