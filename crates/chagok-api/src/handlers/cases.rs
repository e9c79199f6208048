//! Case lifecycle and membership handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use chagok_core::{Case, CaseMember, CaseRole, CaseStatus};

use crate::auth::{require_role, AuthUser};
use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateCaseRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `POST /cases` — create a case; the caller becomes its owner.
pub async fn create_case(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateCaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }

    let id = format!("case_{}", &Uuid::new_v4().simple().to_string()[..12]);
    let case = Case {
        id: id.clone(),
        title: title.to_string(),
        description: req.description,
        status: CaseStatus::Active,
        owner_id: claims.user_id.clone(),
        search_index_ref: None,
        created_at: Utc::now(),
        closed_at: None,
    };
    state.cases.create(&case).await?;

    info!(
        subsystem = "api",
        component = "cases",
        op = "create",
        case_id = %id,
        user_id = %claims.user_id,
        "Case created"
    );
    Ok((StatusCode::CREATED, Json(case)))
}

/// `POST /cases/{case_id}/close` — owner only. Soft-deletes the case's
/// evidence and drops its vector index; the index drop is best-effort.
pub async fn close_case(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(case_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&state, &claims, &case_id, CaseRole::Owner).await?;

    state.cases.close(&case_id).await?;
    let soft_deleted = state.evidence.soft_delete_by_case(&case_id).await?;

    if let Err(e) = state.index.drop_case(&case_id).await {
        warn!(
            subsystem = "api",
            component = "cases",
            op = "close",
            case_id = %case_id,
            error_msg = %e,
            "Index drop failed; case closed anyway"
        );
    }

    info!(
        subsystem = "api",
        component = "cases",
        op = "close",
        case_id = %case_id,
        user_id = %claims.user_id,
        result_count = soft_deleted,
        "Case closed"
    );
    Ok(Json(serde_json::json!({
        "case_id": case_id,
        "status": "closed",
        "evidence_soft_deleted": soft_deleted,
    })))
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub user_id: String,
    pub role: CaseRole,
}

/// `POST /cases/{case_id}/members` — owner only.
pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(case_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&state, &claims, &case_id, CaseRole::Owner).await?;

    if req.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }

    state
        .cases
        .add_member(&CaseMember {
            case_id: case_id.clone(),
            user_id: req.user_id.clone(),
            role: req.role,
            added_at: Utc::now(),
        })
        .await?;

    info!(
        subsystem = "api",
        component = "cases",
        op = "add_member",
        case_id = %case_id,
        user_id = %req.user_id,
        "Member added"
    );
    Ok(StatusCode::NO_CONTENT)
}
