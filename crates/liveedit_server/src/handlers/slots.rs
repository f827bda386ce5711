//! Slot and view read handlers.

use crate::error::HttpError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use liveedit_core::invalidate::RouteGeneration;
use liveedit_core::models::DocumentSlots;
use liveedit_core::EditTarget;

/// Current slot values of one target document.
///
/// # Arguments
/// - `target`: `hero`, `mission` or `vial`.
///
/// # Errors
/// Returns `404` for an unknown target and the mapped status for load
/// failures.
pub async fn read_slots(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<DocumentSlots>, HttpError> {
    let target = EditTarget::from_slug(&target).ok_or_else(|| {
        HttpError::new(
            StatusCode::NOT_FOUND,
            format!("Unknown edit target '{}'", target),
        )
    })?;
    Ok(Json(state.editor.read_slots(target).await?))
}

/// Route generations bumped by successful saves.
pub async fn list_views(State(state): State<AppState>) -> Json<Vec<RouteGeneration>> {
    Json(state.editor.views().snapshot())
}
