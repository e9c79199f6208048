//! Qdrant-compatible REST backend for the per-case vector index.
//!
//! Talks plain HTTP to a Qdrant server (or API-compatible stand-in). One
//! collection per case, cosine distance, created lazily on first upsert.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use chagok_core::defaults::EMBEDDING_DIM;
use chagok_core::{Error, Result, VectorDocument, VectorSearchHit};

use crate::{index_name_for_case, CaseVectorIndex};

/// Configuration for the REST index backend.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Base URL, e.g. `http://localhost:6333`.
    pub base_url: String,
    /// Optional API key sent as the `api-key` header.
    pub api_key: Option<String>,
    /// Vector dimensionality for newly created collections.
    pub embedding_dim: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl QdrantConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            embedding_dim: EMBEDDING_DIM,
            timeout: Duration::from_secs(30),
        }
    }

    /// Read configuration from environment variables. Returns `None` when
    /// no index URL is configured (local dev falls back to in-memory).
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(chagok_core::defaults::ENV_INDEX_BASE_URL).ok()?;
        if base_url.is_empty() {
            return None;
        }
        let api_key = std::env::var(chagok_core::defaults::ENV_INDEX_API_KEY).ok();
        Some(Self {
            api_key,
            ..Self::new(base_url)
        })
    }
}

/// REST client implementation of [`CaseVectorIndex`].
pub struct QdrantVectorIndex {
    config: QdrantConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<serde_json::Value>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

impl QdrantVectorIndex {
    pub fn new(config: QdrantConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut builder = self.client.request(method, url).timeout(self.config.timeout);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    /// Check connectivity to the index server.
    pub async fn health_check(&self) -> Result<bool> {
        match self
            .request(reqwest::Method::GET, "/readyz")
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn ensure_collection(&self, name: &str) -> Result<()> {
        let exists = self
            .request(reqwest::Method::GET, &format!("/collections/{}/exists", name))
            .send()
            .await?;
        if exists.status().is_success() {
            let body: serde_json::Value = exists.json().await?;
            if body.pointer("/result/exists").and_then(|v| v.as_bool()) == Some(true) {
                return Ok(());
            }
        }

        let resp = self
            .request(reqwest::Method::PUT, &format!("/collections/{}", name))
            .json(&json!({
                "vectors": {
                    "size": self.config.embedding_dim,
                    "distance": "Cosine"
                }
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Index(format!(
                "collection create returned {}: {}",
                status, body
            )));
        }

        info!(
            subsystem = "index",
            component = "qdrant",
            op = "create_collection",
            collection = %name,
            "Created case collection"
        );
        Ok(())
    }

    fn hit_from_point(point: ScoredPoint) -> Option<VectorSearchHit> {
        let payload = point.payload?;
        let doc = VectorDocument {
            id: payload.get("doc_id")?.as_str()?.to_string(),
            case_id: payload.get("case_id")?.as_str()?.to_string(),
            evidence_id: payload.get("evidence_id")?.as_str()?.to_string(),
            content: payload
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            labels: payload
                .get("labels")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|l| l.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
            speaker: payload
                .get("speaker")
                .and_then(|v| v.as_str())
                .map(String::from),
            timestamp: payload
                .get("timestamp")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(chrono::Utc::now),
            embedding: point.vector.unwrap_or_default(),
        };
        Some(VectorSearchHit {
            score: point.score,
            document: doc,
        })
    }
}

#[async_trait]
impl CaseVectorIndex for QdrantVectorIndex {
    async fn upsert(&self, case_id: &str, doc: &VectorDocument) -> Result<()> {
        let name = index_name_for_case(case_id);
        self.ensure_collection(&name).await?;

        let point_id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, doc.id.as_bytes());
        let resp = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points?wait=true", name),
            )
            .json(&json!({
                "points": [{
                    "id": point_id.to_string(),
                    "vector": doc.embedding,
                    "payload": {
                        "doc_id": doc.id,
                        "case_id": doc.case_id,
                        "evidence_id": doc.evidence_id,
                        "content": doc.content,
                        "labels": doc.labels,
                        "speaker": doc.speaker,
                        "timestamp": doc.timestamp.to_rfc3339(),
                    }
                }]
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Index(format!("upsert returned {}: {}", status, body)));
        }

        debug!(
            subsystem = "index",
            component = "qdrant",
            op = "upsert",
            case_id = %case_id,
            evidence_id = %doc.evidence_id,
            "Vector document upserted"
        );
        Ok(())
    }

    async fn search(
        &self,
        case_id: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchHit>> {
        let name = index_name_for_case(case_id);
        if !self.case_exists(case_id).await? {
            warn!(
                subsystem = "index",
                component = "qdrant",
                case_id = %case_id,
                "Collection does not exist; returning empty result"
            );
            return Ok(Vec::new());
        }

        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/search", name),
            )
            .json(&json!({
                "vector": query_embedding,
                "limit": top_k,
                "with_payload": true,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Index(format!("search returned {}: {}", status, body)));
        }

        let parsed: SearchResponse = resp.json().await?;
        Ok(parsed
            .result
            .into_iter()
            .filter_map(Self::hit_from_point)
            .collect())
    }

    async fn drop_case(&self, case_id: &str) -> Result<()> {
        let name = index_name_for_case(case_id);
        let resp = self
            .request(reqwest::Method::DELETE, &format!("/collections/{}", name))
            .send()
            .await?;

        // 404 means the collection never existed; treat as success
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            let status = resp.status();
            return Err(Error::Index(format!("collection delete returned {}", status)));
        }

        info!(
            subsystem = "index",
            component = "qdrant",
            op = "drop_case",
            case_id = %case_id,
            "Case collection dropped"
        );
        Ok(())
    }

    async fn case_exists(&self, case_id: &str) -> Result<bool> {
        let name = index_name_for_case(case_id);
        let resp = self
            .request(reqwest::Method::GET, &format!("/collections/{}/exists", name))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(false);
        }
        let body: serde_json::Value = resp.json().await?;
        Ok(body.pointer("/result/exists").and_then(|v| v.as_bool()) == Some(true))
    }
}
