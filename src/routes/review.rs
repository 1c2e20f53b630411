use crate::{
    AppState,
    auth::{REVIEWERS, role_gate},
    handlers,
};
use axum::{
    Router, middleware,
    routing::{get, put},
};

/// Review Router Module
///
/// Moderation endpoints for supervisors and admins. Must be mounted inside
/// `auth_middleware`: the role gate reads the identity the auth gate attached.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        // GET /api/projects/{status}
        // Review queue, e.g. /api/projects/pending.
        .route("/api/projects/{status}", get(handlers::get_projects_by_status))
        // PUT /api/projects/{id}/status
        // Pending -> Approved | Rejected.
        .route(
            "/api/projects/{id}/status",
            put(handlers::update_project_status),
        )
        .route_layer(middleware::from_fn_with_state(REVIEWERS, role_gate))
}
