use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{AppError, AppJson, AppPath, ErrorBody},
    models::{
        AuthResponse, Category, CreateProjectRequest, DocumentUploadRequest,
        DocumentUploadResponse, Faculty, LoginRequest, NewProject, NewUser, Project,
        ProjectListing, ProjectStatus, RegisterRequest, Role, StatusUpdateResponse,
        UpdateStatusRequest, User, UserProfile,
    },
    storage::{self, DOCUMENT_CONTENT_TYPE},
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::{Datelike, Utc};
use url::Url;

/// Returns the trimmed value if present and non-blank.
fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Optional link field: blank is absent, anything else must be an absolute http(s) URL.
fn optional_link(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    let Some(link) = required(value) else {
        return Ok(None);
    };

    match Url::parse(&link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(Some(link)),
        _ => Err(AppError::InvalidRequest(format!(
            "{field} must be a valid http(s) URL."
        ))),
    }
}

// --- Auth Handlers ---

/// register_user
///
/// [Public Route] Creates an account and returns it with a signed token.
///
/// *Validation*: username, email and password are mandatory. The role is matched
/// case-insensitively and defaults to "student" when absent or blank. A supplied
/// faculty must exist.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Missing fields, bad role or duplicate email", body = ErrorBody),
        (status = 404, description = "Unknown faculty", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (Some(username), Some(email), Some(password)) = (
        required(payload.username),
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::InvalidRequest(
            "Please include username, email, password, and role.".to_string(),
        ));
    };

    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => Role::Student,
        Some(raw) => Role::from_name(raw)
            .ok_or_else(|| AppError::InvalidRequest(format!("Unknown role '{raw}'.")))?,
    };

    if let Some(faculty_id) = payload.faculty_id {
        state
            .repo
            .get_faculty(faculty_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Faculty not found.".to_string()))?;
    }

    if state.repo.email_exists(&email).await? {
        return Err(AppError::InvalidRequest("User already exists".to_string()));
    }

    let new_user = NewUser {
        username,
        email,
        password_hash: auth::hash_password(&password)?,
        role,
        faculty_id: payload.faculty_id,
    };

    let user = state.repo.create_user(new_user).await.map_err(|e| {
        // A concurrent registration can still win the race on the unique email index.
        match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                AppError::InvalidRequest("User already exists".to_string())
            }
            _ => AppError::Database(e),
        }
    })?;

    let token = auth::issue_token(user.id, user.role, &state.config.jwt_secret)?;
    tracing::info!(user_id = user.id, role = %user.role, "user registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// login_user
///
/// [Public Route] Verifies credentials and returns the identity with a fresh token.
/// Unknown email and wrong password are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let credentials = state
        .repo
        .get_credentials_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !auth::verify_password(&payload.password, &credentials.password_hash) {
        return Err(invalid());
    }

    let user = credentials.user;
    let token = auth::issue_token(user.id, user.role, &state.config.jwt_secret)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(AuthResponse { user, token }))
}

/// get_me
///
/// [Authenticated Route] Returns the identity resolved by the auth gate.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn get_me(user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(user))
}

/// get_all_users
///
/// [Admin Route] Lists every account, newest first. Password hashes are never selected.
#[utoipa::path(
    get,
    path = "/api/auth/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn get_all_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.repo.list_users().await?))
}

// --- Project Handlers ---

/// get_projects
///
/// [Authenticated Route] Lists approved projects only.
#[utoipa::path(
    get,
    path = "/api/projects",
    responses((status = 200, description = "Approved projects", body = [ProjectListing]))
)]
pub async fn get_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectListing>>, AppError> {
    let projects = state
        .repo
        .list_projects_by_status(ProjectStatus::Approved)
        .await?;
    Ok(Json(projects))
}

/// get_projects_by_status
///
/// [Reviewer Route] Lists projects in any status. The path segment is case-normalized,
/// so `/api/projects/pending` and `/api/projects/Pending` are equivalent.
#[utoipa::path(
    get,
    path = "/api/projects/{status}",
    params(("status" = String, Path, description = "pending | approved | rejected")),
    responses(
        (status = 200, description = "Projects in that status", body = [ProjectListing]),
        (status = 400, description = "Unknown status", body = ErrorBody),
        (status = 403, description = "Not a supervisor or admin", body = ErrorBody)
    )
)]
pub async fn get_projects_by_status(
    State(state): State<AppState>,
    AppPath(status): AppPath<String>,
) -> Result<Json<Vec<ProjectListing>>, AppError> {
    let status = ProjectStatus::from_path_segment(&status)?;
    Ok(Json(state.repo.list_projects_by_status(status).await?))
}

/// create_project
///
/// [Submitter Route] Submits a new project.
///
/// *Integrity*: The submitter and faculty come from the authenticated identity; status
/// is always `Pending` and year is always the current year, whatever the client sends.
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Created", body = Project),
        (status = 400, description = "Missing fields or malformed link", body = ErrorBody),
        (status = 403, description = "Submitter has no faculty", body = ErrorBody),
        (status = 404, description = "Unknown category", body = ErrorBody)
    )
)]
pub async fn create_project(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let Some(faculty_id) = user.faculty_id else {
        tracing::warn!(user_id = user.id, "submission rejected: user has no faculty");
        return Err(AppError::Forbidden(
            "Submitting user is not assigned to a Faculty.".to_string(),
        ));
    };

    let (Some(title), Some(description), Some(category_id), Some(document_url)) = (
        required(payload.title),
        required(payload.description),
        payload.category_id,
        required(payload.document_url),
    ) else {
        return Err(AppError::InvalidRequest(
            "Please include title, description, category ID, and document URL.".to_string(),
        ));
    };

    let github_link = optional_link(payload.github_link, "githubLink")?;
    let demo_link = optional_link(payload.demo_link, "demoLink")?;

    state
        .repo
        .get_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_string()))?;

    let new_project = NewProject {
        title,
        description,
        category_id,
        submitted_by_id: user.id,
        faculty_id,
        github_link,
        demo_link,
        document_url,
        year: Utc::now().year(),
        status: ProjectStatus::INITIAL,
    };

    let project = state.repo.create_project(new_project).await?;
    tracing::info!(project_id = project.id, user_id = user.id, "project submitted");

    Ok((StatusCode::CREATED, Json(project)))
}

/// update_project_status
///
/// [Reviewer Route] Approves or rejects a pending project.
///
/// *Validation*: the body must carry exactly "Approved" or "Rejected". Projects that are
/// already decided cannot be moved again. An id that is not an integer is reported as
/// an unknown project.
#[utoipa::path(
    put,
    path = "/api/projects/{id}/status",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated", body = StatusUpdateResponse),
        (status = 400, description = "Invalid status or illegal transition", body = ErrorBody),
        (status = 403, description = "Not a supervisor or admin", body = ErrorBody),
        (status = 404, description = "Project not found", body = ErrorBody)
    )
)]
pub async fn update_project_status(
    user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let target = ProjectStatus::parse_decision(payload.status.as_deref())?;
    let not_found = || AppError::NotFound("Project not found.".to_string());
    let id: i32 = id.parse().map_err(|_| not_found())?;

    let current = state.repo.get_project(id).await?.ok_or_else(not_found)?;
    let next = current.status.transition(target)?;

    let project = state
        .repo
        .set_project_status(id, next)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(project_id = id, reviewer_id = user.id, status = %next, "project reviewed");

    Ok(Json(StatusUpdateResponse {
        message: format!("Project status updated to {next}."),
        project,
    }))
}

// --- Reference Data ---

/// get_categories
///
/// [Authenticated Route] Lists project categories.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn get_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.repo.list_categories().await?))
}

/// get_faculties
///
/// [Public Route] Lists faculties so the registration form can offer them.
#[utoipa::path(
    get,
    path = "/api/faculties",
    responses((status = 200, description = "Faculties", body = [Faculty]))
)]
pub async fn get_faculties(State(state): State<AppState>) -> Result<Json<Vec<Faculty>>, AppError> {
    Ok(Json(state.repo.list_faculties().await?))
}

// --- Documents ---

/// get_document_upload_url
///
/// [Submitter Route] Issues a 10-minute presigned PUT URL for a project document.
/// Only PDFs are accepted. The returned `resourceKey` is what the client submits as
/// `documentUrl`.
#[utoipa::path(
    post,
    path = "/api/upload/document",
    request_body = DocumentUploadRequest,
    responses(
        (status = 200, description = "URL", body = DocumentUploadResponse),
        (status = 400, description = "Not a PDF", body = ErrorBody)
    )
)]
pub async fn get_document_upload_url(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<DocumentUploadRequest>,
) -> Result<Json<DocumentUploadResponse>, AppError> {
    let is_pdf_name = payload.filename.to_lowercase().ends_with(".pdf");
    if payload.file_type != DOCUMENT_CONTENT_TYPE || !is_pdf_name {
        return Err(AppError::InvalidRequest(
            "Only PDF documents are allowed!".to_string(),
        ));
    }

    let resource_key = storage::document_key();
    let upload_url = state
        .storage
        .get_presigned_upload_url(&resource_key, DOCUMENT_CONTENT_TYPE)
        .await?;

    tracing::debug!(user_id = user.id, key = %resource_key, "issued document upload url");

    Ok(Json(DocumentUploadResponse {
        upload_url,
        resource_key,
    }))
}
