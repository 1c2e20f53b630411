use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints: liveness, registration, login and the faculty list the
/// registration form needs.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/register
        .route("/api/auth/register", post(handlers::register_user))
        // POST /api/auth/login
        .route("/api/auth/login", post(handlers::login_user))
        // GET /api/faculties
        .route("/api/faculties", get(handlers::get_faculties))
}
