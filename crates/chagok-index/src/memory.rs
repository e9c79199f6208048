//! In-memory vector index for tests and single-node local development,
//! mirroring the production backend's collection-per-case layout.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use chagok_core::{Result, VectorDocument, VectorSearchHit};

use crate::{cosine_similarity, CaseVectorIndex};

/// Brute-force cosine index held in memory.
///
/// Collections are created lazily on first upsert, exactly like the REST
/// backend. Adequate for the bounded per-case evidence counts this system
/// deals in; no ANN structure is attempted.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    // case_id -> document id -> document
    collections: RwLock<HashMap<String, HashMap<String, VectorDocument>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a case's collection (test helper).
    pub async fn document_count(&self, case_id: &str) -> usize {
        self.collections
            .read()
            .await
            .get(case_id)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CaseVectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, case_id: &str, doc: &VectorDocument) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(case_id.to_string())
            .or_default()
            .insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn search(
        &self,
        case_id: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchHit>> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(case_id) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<VectorSearchHit> = collection
            .values()
            .map(|doc| VectorSearchHit {
                score: cosine_similarity(query_embedding, &doc.embedding),
                document: doc.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn drop_case(&self, case_id: &str) -> Result<()> {
        self.collections.write().await.remove(case_id);
        Ok(())
    }

    async fn case_exists(&self, case_id: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(case_id))
    }
}
