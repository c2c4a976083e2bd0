//! Router configuration for the filedepot Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};
use super::middleware::create_cors_layer;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .route("/upload", post(handlers::upload))
        .route("/files", get(handlers::list_files))
        .route("/files/:id", delete(handlers::delete_file))
        .route("/files/:id/download", get(handlers::download_file))
        .route("/dashboard/stats", get(handlers::dashboard_stats))
        .route("/users", post(handlers::create_user))
        .route("/users/me", get(handlers::me).put(handlers::update_me));

    let body_limit = app_state.upload_body_limit();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
