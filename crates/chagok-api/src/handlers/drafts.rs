//! Draft preview handler.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use chagok_core::CaseRole;

use crate::auth::{require_role, AuthUser};
use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct DraftPreviewRequest {
    pub sections: Vec<String>,
}

/// `POST /cases/{case_id}/draft-preview` — compose an ephemeral draft for
/// the requested sections. Nothing is persisted or filed.
pub async fn draft_preview(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(case_id): Path<String>,
    Json(req): Json<DraftPreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&state, &claims, &case_id, CaseRole::Member).await?;

    let sections: Vec<String> = req
        .sections
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if sections.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one section is required".to_string(),
        ));
    }

    let preview = state.composer.compose(&case_id, &sections).await?;

    info!(
        subsystem = "api",
        component = "drafts",
        op = "preview",
        case_id = %case_id,
        user_id = %claims.user_id,
        result_count = preview.citations.len(),
        "Draft preview generated"
    );
    Ok(Json(preview))
}
