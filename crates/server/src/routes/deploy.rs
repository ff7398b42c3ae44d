use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use orchestrator::{DeployRequest, DeployResponse};
use tracing::instrument;

use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api-endpoint",
    request_body = DeployRequest,
    responses(
        (status = 200, description = "All rounds published", body = DeployResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 403, description = "Invalid secret", body = ErrorResponse),
        (status = 404, description = "Later round without a completed round 1", body = ErrorResponse),
        (status = 502, description = "Model or repository host failed", body = ErrorResponse)
    ),
    tag = "deploy"
)]
#[instrument(skip_all)]
pub async fn deploy(
    State(state): State<AppState>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Result<Json<DeployResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let response = state.coordinator.handle(request).await?;
    Ok(Json(response))
}
