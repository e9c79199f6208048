//! # chagok-index
//!
//! Per-case semantic search index. Each case owns one isolated collection
//! named deterministically from its id; vector documents are written by the
//! worker, queried read-only by the draft composer, and dropped wholesale
//! when the case closes.

pub mod memory;
pub mod qdrant;

use async_trait::async_trait;

pub use memory::InMemoryVectorIndex;
pub use qdrant::{QdrantConfig, QdrantVectorIndex};

use chagok_core::defaults::INDEX_NAME_PREFIX;
use chagok_core::{Result, VectorDocument, VectorSearchHit};

/// Deterministic collection name for a case's index.
pub fn index_name_for_case(case_id: &str) -> String {
    format!("{}{}", INDEX_NAME_PREFIX, case_id)
}

/// A per-case vector index.
///
/// Implementations must treat upsert as idempotent per document id, and
/// `drop_case` as index-level deletion (not per-document).
#[async_trait]
pub trait CaseVectorIndex: Send + Sync {
    /// Insert or replace one document in the case's collection, creating
    /// the collection on first write.
    async fn upsert(&self, case_id: &str, doc: &VectorDocument) -> Result<()>;

    /// Top-k cosine-similarity search within one case's collection.
    /// A missing collection yields an empty result, not an error.
    async fn search(
        &self,
        case_id: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchHit>>;

    /// Drop the case's entire collection. Missing collections are fine.
    async fn drop_case(&self, case_id: &str) -> Result<()>;

    /// Whether the case has a collection at all.
    async fn case_exists(&self, case_id: &str) -> Result<bool>;
}

/// Cosine similarity between two vectors. Zero for mismatched lengths or
/// zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
