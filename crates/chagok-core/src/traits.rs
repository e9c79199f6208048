//! Repository traits implemented by `chagok-db`.
//!
//! The worker and API crates depend on these seams rather than on concrete
//! storage, so tests can substitute in-memory implementations.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Case, CaseMember, CaseRole, EvidenceRecord, EvidenceStatus};

/// Case and membership persistence.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Create a case. The owner is inserted as a member with role `owner`.
    async fn create(&self, case: &Case) -> Result<()>;

    /// Fetch a case by id.
    async fn get(&self, case_id: &str) -> Result<Option<Case>>;

    /// Mark a case closed and record the closure time.
    async fn close(&self, case_id: &str) -> Result<()>;

    /// Add or update a member of a case.
    async fn add_member(&self, member: &CaseMember) -> Result<()>;

    /// Role of `user_id` in `case_id`, or `None` when not a member.
    async fn role_of(&self, case_id: &str, user_id: &str) -> Result<Option<CaseRole>>;

    /// Set (or clear) the case's vector-index reference.
    async fn set_search_index_ref(&self, case_id: &str, index_ref: Option<&str>) -> Result<()>;
}

/// Evidence record persistence keyed by `(case_id, evidence_id)`.
///
/// The API layer is read-only with respect to analysis fields; only the
/// worker's result writer calls `upsert` after analysis.
#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    /// Insert a new record. Fails on duplicate `(case_id, evidence_id)`.
    async fn insert(&self, record: &EvidenceRecord) -> Result<()>;

    /// Insert or fully replace a record (result-writer commit path).
    async fn upsert(&self, record: &EvidenceRecord) -> Result<()>;

    /// Fetch one record; soft-deleted records are returned (the caller
    /// decides visibility).
    async fn get(&self, case_id: &str, evidence_id: &str) -> Result<Option<EvidenceRecord>>;

    /// All live (non-soft-deleted) records for a case, ascending by upload
    /// timestamp. Full-list semantics; no pagination.
    async fn list_by_case(&self, case_id: &str) -> Result<Vec<EvidenceRecord>>;

    /// Update only the status (and failure reason) of a record. Used for the
    /// `processing` mark and the operator `failed → queued` retry.
    async fn set_status(
        &self,
        case_id: &str,
        evidence_id: &str,
        status: EvidenceStatus,
        failure_reason: Option<&str>,
    ) -> Result<()>;

    /// Soft-delete every record of a case (case closure). Returns the number
    /// of records affected.
    async fn soft_delete_by_case(&self, case_id: &str) -> Result<u64>;
}
