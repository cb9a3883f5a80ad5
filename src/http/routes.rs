use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:session_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        // Recording control
        .route(
            "/sessions/:session_id/record/start",
            post(handlers::start_recording),
        )
        .route(
            "/sessions/:session_id/record/pause",
            post(handlers::pause_recording),
        )
        .route(
            "/sessions/:session_id/record/resume",
            post(handlers::resume_recording),
        )
        .route(
            "/sessions/:session_id/record/chunk",
            post(handlers::upload_chunk),
        )
        .route(
            "/sessions/:session_id/record/stop",
            post(handlers::stop_recording),
        )
        // Answer editing and navigation
        .route("/sessions/:session_id/answer", put(handlers::set_answer))
        .route(
            "/sessions/:session_id/retry",
            post(handlers::retry_transcription),
        )
        .route("/sessions/:session_id/next", post(handlers::next_question))
        .route(
            "/sessions/:session_id/notice/dismiss",
            post(handlers::dismiss_notice),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
