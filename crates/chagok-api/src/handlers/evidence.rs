//! Evidence upload-credential and listing handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use chagok_core::defaults::PRESIGN_MAX_EXPIRY_SECS;
use chagok_core::{
    build_object_key, file_extension, new_evidence_id, CaseRole, CaseStatus, EvidenceRecord,
    EvidenceStatus, MediaType,
};

use crate::auth::{require_role, AuthUser};
use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct PresignQuery {
    pub case_id: String,
    pub filename: String,
}

/// `GET /evidence/presigned-url` — issue a single-PUT upload credential and
/// create the `queued` placeholder record the frontend polls.
pub async fn presigned_url(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(q): Query<PresignQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&state, &claims, &q.case_id, CaseRole::Member).await?;

    let case = state
        .cases
        .get(&q.case_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("case {}", q.case_id)))?;
    if case.status == CaseStatus::Closed {
        return Err(ApiError::Conflict("case is closed".to_string()));
    }

    let filename = q.filename.trim();
    if filename.is_empty() {
        return Err(ApiError::BadRequest("filename is required".to_string()));
    }
    let ext = file_extension(filename)
        .ok_or_else(|| ApiError::BadRequest("filename has no extension".to_string()))?;
    let media_type = MediaType::from_extension(&ext)
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported file type: .{}", ext)))?;

    let evidence_id = new_evidence_id();
    let key = build_object_key(&q.case_id, &evidence_id, filename);
    let presigned = state.presigner.presign_put(&key, PRESIGN_MAX_EXPIRY_SECS)?;

    let placeholder = EvidenceRecord::placeholder(&q.case_id, &evidence_id, media_type, &key);
    state.evidence.insert(&placeholder).await?;

    info!(
        subsystem = "api",
        component = "evidence",
        op = "presign",
        case_id = %q.case_id,
        evidence_id = %evidence_id,
        object_key = %key,
        media_type = %media_type,
        user_id = %claims.user_id,
        "Upload credential issued"
    );

    Ok(Json(serde_json::json!({
        "upload_url": presigned.url,
        "file_key": presigned.key,
        "evidence_id": evidence_id,
        "expires_at": presigned.expires_at,
    })))
}

#[derive(Deserialize)]
pub struct ListEvidenceQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// `GET /cases/{case_id}/evidence` — full list, ascending by upload time,
/// with optional status and label filters.
pub async fn list_evidence(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(case_id): Path<String>,
    Query(q): Query<ListEvidenceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&state, &claims, &case_id, CaseRole::Viewer).await?;

    let status_filter = match q.status.as_deref() {
        Some(s) => Some(
            EvidenceStatus::from_str_opt(s)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {}", s)))?,
        ),
        None => None,
    };

    let mut records = state.evidence.list_by_case(&case_id).await?;
    if let Some(status) = status_filter {
        records.retain(|r| r.status == status);
    }
    if let Some(label) = &q.label {
        records.retain(|r| r.labels.iter().any(|l| l == label));
    }

    Ok(Json(serde_json::json!({
        "case_id": case_id,
        "count": records.len(),
        "evidence": records,
    })))
}

#[derive(Deserialize)]
pub struct DownloadQuery {
    pub case_id: String,
    pub evidence_id: String,
}

/// `GET /evidence/download-url` — presigned GET for a stored evidence file.
pub async fn download_url(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(q): Query<DownloadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&state, &claims, &q.case_id, CaseRole::Viewer).await?;

    let record = state
        .evidence
        .get(&q.case_id, &q.evidence_id)
        .await?
        .filter(|r| r.deleted_at.is_none())
        .ok_or_else(|| ApiError::NotFound(format!("evidence {}", q.evidence_id)))?;

    let presigned = state
        .presigner
        .presign_get(&record.storage_key, PRESIGN_MAX_EXPIRY_SECS)?;

    Ok(Json(serde_json::json!({
        "download_url": presigned.url,
        "file_key": presigned.key,
        "expires_at": presigned.expires_at,
    })))
}
