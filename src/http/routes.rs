use super::handlers;
use super::media_stream;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Provider webhooks
        .route("/twiml", get(handlers::twiml).post(handlers::twiml))
        .route("/call-status", post(handlers::call_status))
        .route("/media-stream", get(media_stream::media_stream))
        // Call queries
        .route("/calls/:call_sid/status", get(handlers::get_call_status))
        .route(
            "/calls/:call_sid/transcript",
            get(handlers::get_call_transcript),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
