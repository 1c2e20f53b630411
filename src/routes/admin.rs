use crate::{
    AppState,
    auth::{ADMIN_ONLY, role_gate},
    handlers,
};
use axum::{Router, middleware, routing::get};

/// Admin Router Module
///
/// Endpoints exclusively for the 'admin' role. Must be mounted inside `auth_middleware`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/auth/users
        // Every account, password hashes excluded.
        .route("/api/auth/users", get(handlers::get_all_users))
        .route_layer(middleware::from_fn_with_state(ADMIN_ONLY, role_gate))
}
