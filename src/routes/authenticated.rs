use crate::{
    AppState,
    auth::{SUBMITTERS, role_gate},
    handlers,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes open to any identity that passed the auth gate. The caller (`create_router`)
/// wraps this router in `auth_middleware`.
///
/// Submission routes add the `SUBMITTERS` role gate at the method level, so it runs
/// after the auth gate has attached the identity.
pub fn authenticated_routes() -> Router<AppState> {
    let submitters_only = || middleware::from_fn_with_state(SUBMITTERS, role_gate);

    Router::<AppState>::new()
        // GET /api/auth/me
        // The caller's resolved identity.
        .route("/api/auth/me", get(handlers::get_me))
        // GET /api/projects  -> approved projects
        // POST /api/projects -> submit a project (student/supervisor/admin)
        .route(
            "/api/projects",
            get(handlers::get_projects)
                .merge(post(handlers::create_project).route_layer(submitters_only())),
        )
        // GET /api/categories
        .route("/api/categories", get(handlers::get_categories))
        // POST /api/upload/document
        // Presigned PDF upload URL, issued before the project is submitted.
        .route(
            "/api/upload/document",
            post(handlers::get_document_upload_url).route_layer(submitters_only()),
        )
}
