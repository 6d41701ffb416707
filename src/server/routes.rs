use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::handlers::{
    create_license_handler, health_handler, verify_license_handler, AppState,
};
use crate::server::logging::request_logging_middleware;

/// Build the application router.
///
/// # Routes
///
/// - `POST /api/verify-license` - Verify a license and bind it on first use
/// - `POST /api/create-license` - Create a license (operator only, unauthenticated)
/// - `GET /health` - Liveness and database connectivity
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/verify-license", post(verify_license_handler))
        .route("/api/create-license", post(create_license_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(request_logging_middleware))
        .with_state(state)
}
