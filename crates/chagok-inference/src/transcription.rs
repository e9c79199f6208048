//! Transcription backend for audio and video evidence.

use async_trait::async_trait;
use chagok_core::{defaults, Error, Result};
use serde::Deserialize;

use crate::OpenAiConfig;

/// Result of audio transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionResult {
    /// Full transcribed text.
    pub text: String,
    /// Detected language (ISO 639-1 code), when the backend reports one.
    pub language: Option<String>,
    /// Total audio duration in seconds.
    pub duration_secs: Option<f64>,
}

/// Backend for transcribing audio data.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe audio data. The filename hint carries the extension the
    /// endpoint uses to pick a decoder.
    async fn transcribe(&self, audio_data: &[u8], filename: &str) -> Result<TranscriptionResult>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool>;

    fn model_name(&self) -> &str;
}

/// OpenAI-compatible Whisper backend.
pub struct OpenAiTranscriptionBackend {
    config: OpenAiConfig,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiTranscriptionBackend {
    pub fn new(config: OpenAiConfig, model: String) -> Self {
        Self {
            config,
            model,
            client: reqwest::Client::new(),
            timeout_secs: 300, // 5 min for long recordings
        }
    }

    /// Create from environment variables. Returns `None` when no API key
    /// is configured.
    pub fn from_env() -> Option<Self> {
        let config = OpenAiConfig::from_env()?;
        let model = std::env::var(defaults::ENV_WHISPER_MODEL)
            .unwrap_or_else(|_| defaults::DEFAULT_WHISPER_MODEL.to_string());
        Some(Self::new(config, model))
    }

    fn mime_for_filename(filename: &str) -> &'static str {
        let ext = filename.rsplit('.').next().unwrap_or_default();
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "m4a" => "audio/mp4",
            "mp4" => "video/mp4",
            "mov" => "video/quicktime",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[async_trait]
impl TranscriptionBackend for OpenAiTranscriptionBackend {
    async fn transcribe(&self, audio_data: &[u8], filename: &str) -> Result<TranscriptionResult> {
        let url = format!("{}/v1/audio/transcriptions", self.config.base_url);

        let file_part = reqwest::multipart::Part::bytes(audio_data.to_vec())
            .file_name(filename.to_string())
            .mime_str(Self::mime_for_filename(filename))
            .map_err(|e| Error::Inference(format!("Failed to create multipart: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Transcription API returned {}: {}",
                status, body
            )));
        }

        let result: WhisperResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse transcription response: {}", e)))?;

        Ok(TranscriptionResult {
            text: result.text,
            language: result.language,
            duration_secs: result.duration,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/models", self.config.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_new() {
        let backend = OpenAiTranscriptionBackend::new(
            OpenAiConfig::new("http://localhost:4000", "sk-test"),
            "whisper-1".to_string(),
        );
        assert_eq!(backend.model_name(), "whisper-1");
        assert_eq!(backend.timeout_secs, 300);
    }

    #[test]
    fn test_mime_for_filename() {
        assert_eq!(OpenAiTranscriptionBackend::mime_for_filename("a.mp3"), "audio/mpeg");
        assert_eq!(OpenAiTranscriptionBackend::mime_for_filename("a.WAV"), "audio/wav");
        assert_eq!(OpenAiTranscriptionBackend::mime_for_filename("clip.mp4"), "video/mp4");
        assert_eq!(OpenAiTranscriptionBackend::mime_for_filename("clip.mov"), "video/quicktime");
        assert_eq!(
            OpenAiTranscriptionBackend::mime_for_filename("noext"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_whisper_response_deserialization() {
        let json = r#"{"text": "통화 녹취 내용", "language": "ko", "duration": 42.5}"#;
        let response: WhisperResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text, "통화 녹취 내용");
        assert_eq!(response.language.as_deref(), Some("ko"));
        assert_eq!(response.duration, Some(42.5));
    }

    #[test]
    fn test_whisper_response_minimal() {
        let response: WhisperResponse = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(response.text, "hello");
        assert!(response.language.is_none());
        assert!(response.duration.is_none());
    }
}
