pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

/// Uploads carry whole PDFs, and bulk uploads several of them.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/domains", get(handlers::handle_list_domains))
        // Evaluation API
        .route("/api/v1/evaluations", post(handlers::handle_evaluate))
        .route(
            "/api/v1/evaluations/upload",
            post(handlers::handle_evaluate_upload),
        )
        .route(
            "/api/v1/evaluations/bulk",
            post(handlers::handle_evaluate_bulk),
        )
        // Reporting API
        .route("/api/v1/candidates", get(handlers::handle_list_candidates))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
