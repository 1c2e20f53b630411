use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue},
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod storage;

// Routers segregated by access tier (Public, Authenticated, Review, Admin).
pub mod routes;
use routes::{admin, authenticated, public, review};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login_user, handlers::get_me,
        handlers::get_all_users, handlers::get_projects, handlers::get_projects_by_status,
        handlers::create_project, handlers::update_project_status, handlers::get_categories,
        handlers::get_faculties, handlers::get_document_upload_url
    ),
    components(
        schemas(
            models::Role, models::ProjectStatus, models::User, models::Project,
            models::ProjectListing, models::Category, models::Faculty,
            models::RegisterRequest, models::LoginRequest, models::CreateProjectRequest,
            models::UpdateStatusRequest, models::DocumentUploadRequest,
            models::AuthResponse, models::UserProfile, models::StatusUpdateResponse,
            models::DocumentUploadResponse, error::ErrorBody,
        )
    ),
    tags(
        (name = "project-portal", description = "Academic Project Submission API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container of everything a request may need. There is no other
/// shared state between requests; the persistence handle is injected here rather than
/// reached through a global.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: database access behind the `Repository` trait.
    pub repo: RepositoryState,
    /// Storage Layer: presigned uploads for project documents.
    pub storage: StorageState,
    /// Configuration: loaded once at startup.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree. Protected requests run through an ordered pipeline:
///
/// 1. `auth_middleware` resolves the bearer token to an `AuthUser` (401 on failure).
/// 2. `role_gate` checks the identity against the route's allow-list (403 on failure).
/// 3. The handler.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    let x_request_id = HeaderName::from_static("x-request-id");

    let protected = Router::new()
        .merge(authenticated::authenticated_routes())
        .merge(review::review_routes())
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// cors_layer
///
/// Restricts CORS to a single configured origin, or allows any origin when none is set
/// (or the configured value is not a valid header value).
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            tracing::warn!("ignoring invalid CORS_ORIGIN: {}", e);
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(allow_origin)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of a request carries its
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
