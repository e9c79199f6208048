//! Embedding backend producing vectors for the per-case index.

use async_trait::async_trait;
use chagok_core::{defaults, Error, Result};
use serde::Deserialize;
use serde_json::json;

use crate::OpenAiConfig;

/// Backend for embedding text.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed one text into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Vector dimensionality this backend produces.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// OpenAI-compatible embeddings backend.
pub struct OpenAiEmbeddingBackend {
    config: OpenAiConfig,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiEmbeddingBackend {
    pub fn new(config: OpenAiConfig, model: String) -> Self {
        Self {
            config,
            model,
            client: reqwest::Client::new(),
            timeout_secs: 60,
        }
    }

    /// Create from environment variables. Returns `None` when no API key
    /// is configured.
    pub fn from_env() -> Option<Self> {
        let config = OpenAiConfig::from_env()?;
        let model = std::env::var(defaults::ENV_EMBEDDING_MODEL)
            .unwrap_or_else(|_| defaults::DEFAULT_EMBEDDING_MODEL.to_string());
        Some(Self::new(config, model))
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({"model": self.model, "input": text}))
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Embedding API returned {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse embedding response: {}", e)))?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Embedding("Embedding response contained no data".to_string()))
    }

    fn dimension(&self) -> usize {
        defaults::EMBEDDING_DIM
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
