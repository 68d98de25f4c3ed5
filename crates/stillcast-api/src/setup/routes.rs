//! Route configuration and setup.

use axum::{
    extract::DefaultBodyLimit,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use stillcast_core::models::PUBLIC_VIDEO_PREFIX;

use crate::handlers;
use crate::state::AppState;

/// Headroom for multipart boundaries on top of the image byte cap.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_image_size_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/api/v0/clips", post(handlers::clips::create_clip))
        .route(
            "/api/v0/clips/compressed",
            post(handlers::clips::create_compressed_clip),
        )
        .route("/healthz", get(liveness_check))
        .nest_service(
            PUBLIC_VIDEO_PREFIX,
            ServeDir::new(state.workspace.dir()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

/// Liveness probe - process is running.
async fn liveness_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}
