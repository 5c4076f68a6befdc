pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;
use crate::upload::handlers;

/// Room for the form text fields and multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Upload page
        .route("/api/v1/upload", post(handlers::handle_upload))
        .route(
            "/api/v1/upload/sessions",
            post(handlers::handle_open_session),
        )
        .route(
            "/api/v1/upload/sessions/:id",
            get(handlers::handle_get_session),
        )
        .route(
            "/api/v1/upload/sessions/:id/file",
            put(handlers::handle_select_file).delete(handlers::handle_clear_file),
        )
        .route(
            "/api/v1/upload/sessions/:id/submit",
            post(handlers::handle_submit),
        )
        // Stored records
        .route("/api/v1/resumes/:id", get(handlers::handle_get_resume))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
