use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

impl HealthResponse {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "pagesmith is running".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn root() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
