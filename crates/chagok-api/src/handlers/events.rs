//! Storage event intake.
//!
//! The blob store delivers object-created notifications here. Delivery is
//! at-least-once, so this endpoint always answers 200 with the outcome
//! summary; a non-2xx reply would make the storage gateway redeliver a
//! batch the worker has already absorbed.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value as JsonValue;
use tracing::info;

use crate::AppState;

/// `POST /internal/storage-events` — run the upload pipeline over one event
/// document.
pub async fn storage_events(
    State(state): State<AppState>,
    Json(event): Json<JsonValue>,
) -> impl IntoResponse {
    let summary = state.upload_handler.handle_event(&event).await;

    info!(
        subsystem = "api",
        component = "events",
        op = "storage_events",
        processed = summary.processed,
        skipped = summary.skipped,
        errors = summary.errors,
        "Storage event batch handled"
    );

    Json(serde_json::json!({
        "processed": summary.processed,
        "skipped": summary.skipped,
        "errors": summary.errors,
    }))
}
