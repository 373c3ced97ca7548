use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Uploaded takes can run long; the 2MB default is far too small
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.upload_dir.clone());

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Clip upload and retrieval
        .route("/upload", post(handlers::upload_audio))
        .nest_service("/uploads", uploads)
        // Recording control
        .route("/record/start", post(handlers::start_recording))
        .route("/record/stop", post(handlers::stop_recording))
        .route("/record/status", get(handlers::get_recorder_status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
