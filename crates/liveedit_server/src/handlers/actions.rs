//! Live-edit action handlers.

use crate::error::{ActionResponse, HttpError};
use crate::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use liveedit_core::models::{ActionCall, HeroTextRequest, MissionPositionsRequest};
use liveedit_core::slots::Transform;

async fn run(state: &AppState, call: ActionCall) -> ActionResponse {
    tracing::debug!("Running action {}", call.name());
    ActionResponse(state.editor.execute(&call).await)
}

/// Replace the hero headline.
///
/// # Errors
/// Returns `400` with a failure body when the payload is malformed.
pub async fn hero_text(
    State(state): State<AppState>,
    payload: Result<Json<HeroTextRequest>, JsonRejection>,
) -> Result<ActionResponse, HttpError> {
    let Json(request) = payload?;
    Ok(run(&state, ActionCall::HeroText(request)).await)
}

/// Move mission cards and the mission vial.
///
/// # Errors
/// Returns `400` with a failure body when the payload is malformed.
pub async fn mission_positions(
    State(state): State<AppState>,
    payload: Result<Json<MissionPositionsRequest>, JsonRejection>,
) -> Result<ActionResponse, HttpError> {
    let Json(request) = payload?;
    Ok(run(&state, ActionCall::MissionPositions(request)).await)
}

/// Set the medical-core vial transform.
///
/// # Errors
/// Returns `400` with a failure body when the payload is malformed.
pub async fn vial_position(
    State(state): State<AppState>,
    payload: Result<Json<Transform>, JsonRejection>,
) -> Result<ActionResponse, HttpError> {
    let Json(transform) = payload?;
    Ok(run(&state, ActionCall::VialPosition(transform)).await)
}
