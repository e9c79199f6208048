//! In-memory repository implementations for tests and local development.
//!
//! Behavior matches the PostgreSQL repositories: `(case_id, evidence_id)`
//! uniqueness, soft deletion, and ascending upload-time listing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use chagok_core::{
    Case, CaseMember, CaseRepository, CaseRole, CaseStatus, Error, EvidenceRecord,
    EvidenceRepository, EvidenceStatus, Result,
};

/// In-memory [`CaseRepository`].
#[derive(Default)]
pub struct InMemoryCaseRepository {
    cases: RwLock<HashMap<String, Case>>,
    members: RwLock<HashMap<(String, String), CaseRole>>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn create(&self, case: &Case) -> Result<()> {
        let mut cases = self.cases.write().await;
        if cases.contains_key(&case.id) {
            return Err(Error::Conflict(format!("case {} already exists", case.id)));
        }
        cases.insert(case.id.clone(), case.clone());
        self.members
            .write()
            .await
            .insert((case.id.clone(), case.owner_id.clone()), CaseRole::Owner);
        Ok(())
    }

    async fn get(&self, case_id: &str) -> Result<Option<Case>> {
        Ok(self.cases.read().await.get(case_id).cloned())
    }

    async fn close(&self, case_id: &str) -> Result<()> {
        let mut cases = self.cases.write().await;
        let case = cases
            .get_mut(case_id)
            .ok_or_else(|| Error::CaseNotFound(case_id.to_string()))?;
        if case.status == CaseStatus::Closed {
            return Err(Error::Conflict(format!("case {} is already closed", case_id)));
        }
        case.status = CaseStatus::Closed;
        case.closed_at = Some(Utc::now());
        case.search_index_ref = None;
        Ok(())
    }

    async fn add_member(&self, member: &CaseMember) -> Result<()> {
        self.members.write().await.insert(
            (member.case_id.clone(), member.user_id.clone()),
            member.role,
        );
        Ok(())
    }

    async fn role_of(&self, case_id: &str, user_id: &str) -> Result<Option<CaseRole>> {
        Ok(self
            .members
            .read()
            .await
            .get(&(case_id.to_string(), user_id.to_string()))
            .copied())
    }

    async fn set_search_index_ref(&self, case_id: &str, index_ref: Option<&str>) -> Result<()> {
        let mut cases = self.cases.write().await;
        let case = cases
            .get_mut(case_id)
            .ok_or_else(|| Error::CaseNotFound(case_id.to_string()))?;
        case.search_index_ref = index_ref.map(String::from);
        Ok(())
    }
}

/// In-memory [`EvidenceRepository`].
#[derive(Default)]
pub struct InMemoryEvidenceRepository {
    records: RwLock<HashMap<(String, String), EvidenceRecord>>,
}

impl InMemoryEvidenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total record count including soft-deleted rows (test helper).
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EvidenceRepository for InMemoryEvidenceRepository {
    async fn insert(&self, record: &EvidenceRecord) -> Result<()> {
        let key = (record.case_id.clone(), record.evidence_id.clone());
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(Error::Conflict(format!(
                "evidence {}/{} already exists",
                record.case_id, record.evidence_id
            )));
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn upsert(&self, record: &EvidenceRecord) -> Result<()> {
        self.records.write().await.insert(
            (record.case_id.clone(), record.evidence_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn get(&self, case_id: &str, evidence_id: &str) -> Result<Option<EvidenceRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(case_id.to_string(), evidence_id.to_string()))
            .cloned())
    }

    async fn list_by_case(&self, case_id: &str) -> Result<Vec<EvidenceRecord>> {
        let records = self.records.read().await;
        let mut list: Vec<EvidenceRecord> = records
            .values()
            .filter(|r| r.case_id == case_id && r.deleted_at.is_none())
            .cloned()
            .collect();
        list.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
        Ok(list)
    }

    async fn set_status(
        &self,
        case_id: &str,
        evidence_id: &str,
        status: EvidenceStatus,
        failure_reason: Option<&str>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&(case_id.to_string(), evidence_id.to_string()))
            .ok_or_else(|| Error::EvidenceNotFound(format!("{}/{}", case_id, evidence_id)))?;
        record.status = status;
        record.failure_reason = failure_reason.map(String::from);
        Ok(())
    }

    async fn soft_delete_by_case(&self, case_id: &str) -> Result<u64> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let mut count = 0;
        for record in records.values_mut() {
            if record.case_id == case_id && record.deleted_at.is_none() {
                record.deleted_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }
}
