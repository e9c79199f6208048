//! Vision backend for image evidence (screenshots, photos, scanned pages).

use async_trait::async_trait;
use base64::Engine;
use chagok_core::{defaults, Error, Result};
use serde::Deserialize;
use serde_json::json;

use crate::OpenAiConfig;

/// Backend for describing images with a vision-capable model.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Describe an image, extracting any visible text verbatim.
    async fn describe_image(
        &self,
        image_data: &[u8],
        mime_type: &str,
        prompt: Option<&str>,
    ) -> Result<String>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool>;

    fn model_name(&self) -> &str;
}

const DEFAULT_PROMPT: &str = "이 이미지를 자세히 설명하세요. 이미지에 보이는 모든 텍스트는 \
원문 그대로 옮겨 적으세요. 메신저 대화 캡처라면 발신자와 시각도 함께 기록하세요.";

/// OpenAI-compatible chat-completions vision backend.
pub struct OpenAiVisionBackend {
    config: OpenAiConfig,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiVisionBackend {
    pub fn new(config: OpenAiConfig, model: String) -> Self {
        Self {
            config,
            model,
            client: reqwest::Client::new(),
            timeout_secs: 120,
        }
    }

    /// Create from environment variables. Returns `None` when no API key
    /// is configured.
    pub fn from_env() -> Option<Self> {
        let config = OpenAiConfig::from_env()?;
        let model = std::env::var(defaults::ENV_VISION_MODEL)
            .unwrap_or_else(|_| defaults::DEFAULT_VISION_MODEL.to_string());
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
impl VisionBackend for OpenAiVisionBackend {
    async fn describe_image(
        &self,
        image_data: &[u8],
        mime_type: &str,
        prompt: Option<&str>,
    ) -> Result<String> {
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);
        let data_url = format!("data:{};base64,{}", mime_type, image_b64);
        let prompt = prompt.unwrap_or(DEFAULT_PROMPT);

        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ]
            }]
        });

        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Vision request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Vision API returned {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse vision response: {}", e)))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Inference("Vision response contained no content".to_string()))
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
