//! # chagok-inference
//!
//! Clients for the AI backends the evidence pipeline depends on:
//!
//! - **Transcription** — audio to text (OpenAI-compatible Whisper endpoint)
//! - **Vision** — image description and text extraction (chat completions
//!   with image content)
//! - **Embedding** — text to vectors for the case index
//! - **Generation** — chat completions for evidence analysis and draft
//!   composition
//!
//! All backends are trait objects so the worker and the draft composer can
//! run against deterministic mocks in tests.

pub mod embedding;
pub mod generation;
pub mod mock;
pub mod transcription;
pub mod vision;

pub use embedding::{EmbeddingBackend, OpenAiEmbeddingBackend};
pub use generation::{ChatMessage, GenerationBackend, OpenAiGenerationBackend};
pub use mock::{MockEmbeddingBackend, MockGenerationBackend, MockTranscriptionBackend, MockVisionBackend};
pub use transcription::{OpenAiTranscriptionBackend, TranscriptionBackend, TranscriptionResult};
pub use vision::{OpenAiVisionBackend, VisionBackend};

use chagok_core::defaults;

/// Shared connection settings for the OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
}

impl OpenAiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Read connection settings from the environment.
    /// Returns `None` when no API key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(defaults::ENV_OPENAI_API_KEY).ok()?;
        if api_key.is_empty() {
            return None;
        }
        let base_url = std::env::var(defaults::ENV_OPENAI_BASE_URL)
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        Some(Self::new(base_url, api_key))
    }
}
