pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pagesmith API",
        version = "0.1.0",
        description = "Generates static web apps from task briefs and publishes them to GitHub Pages"
    ),
    paths(routes::root, routes::health_check, routes::deploy),
    components(schemas(
        routes::HealthResponse,
        error::ErrorResponse,
        orchestrator::DeployRequest,
        orchestrator::RoundRequest,
        orchestrator::Attachments,
        orchestrator::AttachmentRef,
        orchestrator::DeployResponse,
        orchestrator::RoundResult,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "deploy", description = "Task generation and publication"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/", get(routes::root))
        .route("/health", get(routes::health_check))
        .route("/api-endpoint", post(routes::deploy))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
