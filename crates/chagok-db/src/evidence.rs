//! Evidence record repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use chagok_core::{
    Error, EvidenceRecord, EvidenceRepository, EvidenceStatus, MediaType, Result,
};

/// PostgreSQL implementation of [`EvidenceRepository`].
///
/// Records are keyed `(case_id, evidence_id)`; `upsert` implements the
/// result writer's update-or-create path in a single statement so redelivered
/// commits cannot race into duplicate rows.
pub struct PgEvidenceRepository {
    pool: PgPool,
}

impl PgEvidenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn labels_json(labels: &[String]) -> serde_json::Value {
        serde_json::Value::Array(
            labels
                .iter()
                .map(|l| serde_json::Value::String(l.clone()))
                .collect(),
        )
    }

    fn strings_from_json(value: serde_json::Value) -> Vec<String> {
        value
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> EvidenceRecord {
        let media: String = row.get("media_type");
        let status: String = row.get("status");
        EvidenceRecord {
            case_id: row.get("case_id"),
            evidence_id: row.get("evidence_id"),
            media_type: MediaType::from_str_opt(&media).unwrap_or(MediaType::Text),
            uploaded_at: row.get("uploaded_at"),
            speaker: row.get("speaker"),
            labels: Self::strings_from_json(row.get("labels")),
            ai_summary: row.get("ai_summary"),
            insights: Self::strings_from_json(row.get("insights")),
            content: row.get("content"),
            storage_key: row.get("storage_key"),
            status: EvidenceStatus::from_str_opt(&status).unwrap_or(EvidenceStatus::Queued),
            failure_reason: row.get("failure_reason"),
            vector_id: row.get("vector_id"),
            result_hash: row.get("result_hash"),
            deleted_at: row.get("deleted_at"),
        }
    }
}

#[async_trait]
impl EvidenceRepository for PgEvidenceRepository {
    async fn insert(&self, record: &EvidenceRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO evidence_records
                 (case_id, evidence_id, media_type, uploaded_at, speaker, labels,
                  ai_summary, insights, content, storage_key, status, failure_reason,
                  vector_id, result_hash, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(&record.case_id)
        .bind(&record.evidence_id)
        .bind(record.media_type.as_str())
        .bind(record.uploaded_at)
        .bind(&record.speaker)
        .bind(Self::labels_json(&record.labels))
        .bind(&record.ai_summary)
        .bind(Self::labels_json(&record.insights))
        .bind(&record.content)
        .bind(&record.storage_key)
        .bind(record.status.as_str())
        .bind(&record.failure_reason)
        .bind(&record.vector_id)
        .bind(&record.result_hash)
        .bind(record.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn upsert(&self, record: &EvidenceRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO evidence_records
                 (case_id, evidence_id, media_type, uploaded_at, speaker, labels,
                  ai_summary, insights, content, storage_key, status, failure_reason,
                  vector_id, result_hash, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             ON CONFLICT (case_id, evidence_id) DO UPDATE SET
                 media_type = EXCLUDED.media_type,
                 speaker = EXCLUDED.speaker,
                 labels = EXCLUDED.labels,
                 ai_summary = EXCLUDED.ai_summary,
                 insights = EXCLUDED.insights,
                 content = EXCLUDED.content,
                 status = EXCLUDED.status,
                 failure_reason = EXCLUDED.failure_reason,
                 vector_id = EXCLUDED.vector_id,
                 result_hash = EXCLUDED.result_hash",
        )
        .bind(&record.case_id)
        .bind(&record.evidence_id)
        .bind(record.media_type.as_str())
        .bind(record.uploaded_at)
        .bind(&record.speaker)
        .bind(Self::labels_json(&record.labels))
        .bind(&record.ai_summary)
        .bind(Self::labels_json(&record.insights))
        .bind(&record.content)
        .bind(&record.storage_key)
        .bind(record.status.as_str())
        .bind(&record.failure_reason)
        .bind(&record.vector_id)
        .bind(&record.result_hash)
        .bind(record.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "evidence",
            op = "upsert",
            case_id = %record.case_id,
            evidence_id = %record.evidence_id,
            status = %record.status,
            "Evidence record written"
        );
        Ok(())
    }

    async fn get(&self, case_id: &str, evidence_id: &str) -> Result<Option<EvidenceRecord>> {
        let row = sqlx::query(
            "SELECT * FROM evidence_records WHERE case_id = $1 AND evidence_id = $2",
        )
        .bind(case_id)
        .bind(evidence_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.map(Self::parse_row))
    }

    async fn list_by_case(&self, case_id: &str) -> Result<Vec<EvidenceRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM evidence_records
             WHERE case_id = $1 AND deleted_at IS NULL
             ORDER BY uploaded_at ASC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.into_iter().map(Self::parse_row).collect())
    }

    async fn set_status(
        &self,
        case_id: &str,
        evidence_id: &str,
        status: EvidenceStatus,
        failure_reason: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE evidence_records SET status = $3, failure_reason = $4
             WHERE case_id = $1 AND evidence_id = $2",
        )
        .bind(case_id)
        .bind(evidence_id)
        .bind(status.as_str())
        .bind(failure_reason)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::EvidenceNotFound(format!(
                "{}/{}",
                case_id, evidence_id
            )));
        }
        Ok(())
    }

    async fn soft_delete_by_case(&self, case_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE evidence_records SET deleted_at = $2
             WHERE case_id = $1 AND deleted_at IS NULL",
        )
        .bind(case_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "evidence",
            op = "soft_delete_by_case",
            case_id = %case_id,
            result_count = result.rows_affected(),
            "Evidence soft-deleted for closed case"
        );
        Ok(result.rows_affected())
    }
}
