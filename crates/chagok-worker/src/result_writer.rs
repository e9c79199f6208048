//! The single writer of evidence analysis fields.
//!
//! Everything downstream of parsing funnels through `commit`, which
//! enforces the status state machine, dedupes redelivered results by
//! content hash, and keeps the record and the vector index consistent
//! (record first, index before the final status flip).

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use chagok_core::{
    new_evidence_id, AnalysisOutcome, AnalysisSuccess, CaseRepository, Error, EvidenceRecord,
    EvidenceRepository, EvidenceStatus, MediaType, Result,
};
use chagok_index::{index_name_for_case, CaseVectorIndex};

pub struct ResultWriter {
    cases: Arc<dyn CaseRepository>,
    evidence: Arc<dyn EvidenceRepository>,
    index: Arc<dyn CaseVectorIndex>,
}

/// Stable hash of an analysis payload, used to prove a redelivered commit
/// identical and skip it. The embedding is derived from the content, so
/// hashing the textual fields suffices.
pub fn result_hash(success: &AnalysisSuccess) -> String {
    let mut hasher = Sha256::new();
    hasher.update(success.content.as_bytes());
    hasher.update([0]);
    hasher.update(success.summary.as_bytes());
    for label in &success.labels {
        hasher.update([0]);
        hasher.update(label.as_bytes());
    }
    for insight in &success.insights {
        hasher.update([1]);
        hasher.update(insight.as_bytes());
    }
    if let Some(speaker) = &success.speaker {
        hasher.update([2]);
        hasher.update(speaker.as_bytes());
    }
    hex::encode(hasher.finalize())
}

impl ResultWriter {
    pub fn new(
        cases: Arc<dyn CaseRepository>,
        evidence: Arc<dyn EvidenceRepository>,
        index: Arc<dyn CaseVectorIndex>,
    ) -> Self {
        Self {
            cases,
            evidence,
            index,
        }
    }

    /// Commit one analysis outcome.
    ///
    /// `evidence_id` is `None` for legacy keys; the writer then creates a
    /// fresh record instead of updating a placeholder. Returns the evidence
    /// id the outcome landed on.
    pub async fn commit(
        &self,
        case_id: &str,
        evidence_id: Option<&str>,
        storage_key: &str,
        media_type: MediaType,
        outcome: AnalysisOutcome,
    ) -> Result<String> {
        let record = self
            .resolve_record(case_id, evidence_id, storage_key, media_type)
            .await?;
        let evidence_id = record.evidence_id.clone();

        match outcome {
            AnalysisOutcome::Success(success) => {
                self.commit_success(record, &success).await?;
            }
            AnalysisOutcome::Failure { reason } => {
                self.commit_failure(record, &reason).await?;
            }
        }
        Ok(evidence_id)
    }

    /// Find the record the outcome belongs to, creating one when the key
    /// carried no id (legacy shape) or the placeholder is missing.
    async fn resolve_record(
        &self,
        case_id: &str,
        evidence_id: Option<&str>,
        storage_key: &str,
        media_type: MediaType,
    ) -> Result<EvidenceRecord> {
        if let Some(id) = evidence_id {
            if let Some(existing) = self.evidence.get(case_id, id).await? {
                return Ok(existing);
            }
            // Canonical key but no placeholder (e.g. direct upload); fall
            // back to creating the record under the embedded id
            let record = EvidenceRecord::placeholder(case_id, id, media_type, storage_key);
            self.evidence.insert(&record).await?;
            warn!(
                subsystem = "worker",
                component = "result_writer",
                case_id = %case_id,
                evidence_id = %id,
                "No placeholder for canonical key; record created"
            );
            return Ok(record);
        }

        let id = new_evidence_id();
        let record = EvidenceRecord::placeholder(case_id, &id, media_type, storage_key);
        self.evidence.insert(&record).await?;
        info!(
            subsystem = "worker",
            component = "result_writer",
            case_id = %case_id,
            evidence_id = %id,
            object_key = %storage_key,
            "Legacy key; created record"
        );
        Ok(record)
    }

    async fn commit_success(
        &self,
        mut record: EvidenceRecord,
        success: &AnalysisSuccess,
    ) -> Result<()> {
        let hash = result_hash(success);
        if record.result_hash.as_deref() == Some(hash.as_str()) {
            info!(
                subsystem = "worker",
                component = "result_writer",
                case_id = %record.case_id,
                evidence_id = %record.evidence_id,
                "Duplicate delivery; commit is a no-op"
            );
            return Ok(());
        }

        if !record.status.can_transition_to(EvidenceStatus::Completed) {
            return Err(Error::InvalidTransition(format!(
                "{} -> completed",
                record.status
            )));
        }

        // Index write precedes the status flip so a completed record always
        // has its vector document
        let vector_id = format!("vec_{}", record.evidence_id);
        let doc = chagok_core::VectorDocument {
            id: vector_id.clone(),
            case_id: record.case_id.clone(),
            evidence_id: record.evidence_id.clone(),
            content: success.content.clone(),
            labels: success.labels.clone(),
            speaker: success.speaker.clone(),
            timestamp: record.uploaded_at,
            embedding: success.embedding.clone(),
        };
        self.index.upsert(&record.case_id, &doc).await?;
        self.link_case_index(&record.case_id).await?;

        record.content = Some(success.content.clone());
        record.ai_summary = Some(success.summary.clone());
        record.labels = success.labels.clone();
        record.insights = success.insights.clone();
        record.speaker = success.speaker.clone();
        record.status = EvidenceStatus::Completed;
        record.failure_reason = None;
        record.vector_id = Some(vector_id);
        record.result_hash = Some(hash);
        self.evidence.upsert(&record).await?;

        info!(
            subsystem = "worker",
            component = "result_writer",
            case_id = %record.case_id,
            evidence_id = %record.evidence_id,
            status = %record.status,
            "Analysis committed"
        );
        Ok(())
    }

    async fn commit_failure(&self, record: EvidenceRecord, reason: &str) -> Result<()> {
        if !record.status.can_transition_to(EvidenceStatus::Failed) {
            return Err(Error::InvalidTransition(format!(
                "{} -> failed",
                record.status
            )));
        }

        self.evidence
            .set_status(
                &record.case_id,
                &record.evidence_id,
                EvidenceStatus::Failed,
                Some(reason),
            )
            .await?;

        warn!(
            subsystem = "worker",
            component = "result_writer",
            case_id = %record.case_id,
            evidence_id = %record.evidence_id,
            error_msg = %reason,
            "Analysis failed"
        );
        Ok(())
    }

    /// Record the case's index reference on first write.
    async fn link_case_index(&self, case_id: &str) -> Result<()> {
        match self.cases.get(case_id).await? {
            Some(case) if case.search_index_ref.is_none() => {
                let index_ref = index_name_for_case(case_id);
                self.cases
                    .set_search_index_ref(case_id, Some(&index_ref))
                    .await?;
                Ok(())
            }
            Some(_) => Ok(()),
            None => {
                warn!(
                    subsystem = "worker",
                    component = "result_writer",
                    case_id = %case_id,
                    "Committed evidence for unknown case"
                );
                Ok(())
            }
        }
    }
}
