use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::OrchestratorError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Orchestrator(OrchestratorError),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Pipeline stage that failed.
    pub stage: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", "validation"),
            AppError::Orchestrator(err) => {
                let (status, error) = match err {
                    OrchestratorError::Unauthorized => (StatusCode::FORBIDDEN, "unauthorized"),
                    OrchestratorError::InvalidRequest(_) => {
                        (StatusCode::BAD_REQUEST, "bad_request")
                    }
                    OrchestratorError::BaselineNotFound { .. } => {
                        (StatusCode::NOT_FOUND, "not_found")
                    }
                    OrchestratorError::Generation { .. } => {
                        (StatusCode::BAD_GATEWAY, "generation_failed")
                    }
                    OrchestratorError::Repository { .. } => {
                        (StatusCode::BAD_GATEWAY, "repository_failed")
                    }
                    OrchestratorError::Store(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
                    }
                };
                (status, error, err.stage())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, stage) = self.parts();

        let message = match &self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Orchestrator(err) => {
                if status.is_server_error() {
                    tracing::error!(stage, round = ?err.round(), "Request failed: {:?}", err);
                } else {
                    tracing::warn!(stage, "Request rejected: {}", err);
                }
                err.to_string()
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            stage: stage.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        AppError::Orchestrator(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generator::GeneratorError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OrchestratorError::Unauthorized, StatusCode::FORBIDDEN),
            (
                OrchestratorError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                OrchestratorError::BaselineNotFound {
                    identity: "a/t".to_string(),
                    round: 2,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                OrchestratorError::generation(1, GeneratorError::EmptyResponse),
                StatusCode::BAD_GATEWAY,
            ),
            (
                OrchestratorError::Store(pagesmith_core::CoreError::Store("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
