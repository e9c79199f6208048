//! Text generation backend used for evidence analysis and draft composition.

use async_trait::async_trait;
use chagok_core::{defaults, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::OpenAiConfig;

/// One message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Backend for chat-style text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run a chat completion and return the assistant's text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool>;

    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat-completions backend.
pub struct OpenAiGenerationBackend {
    config: OpenAiConfig,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiGenerationBackend {
    pub fn new(config: OpenAiConfig, model: String) -> Self {
        Self {
            config,
            model,
            client: reqwest::Client::new(),
            timeout_secs: 180,
        }
    }

    /// Create from environment variables. Returns `None` when no API key
    /// is configured.
    pub fn from_env() -> Option<Self> {
        let config = OpenAiConfig::from_env()?;
        let model = std::env::var(defaults::ENV_GENERATION_MODEL)
            .unwrap_or_else(|_| defaults::DEFAULT_GENERATION_MODEL.to_string());
        Some(Self::new(config, model))
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GenerationBackend for OpenAiGenerationBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({"model": self.model, "messages": messages}))
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Generation API returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse generation response: {}", e)))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Inference("Generation response contained no content".to_string()))
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
