use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Closed Variant Types ---

/// Role
///
/// The RBAC field of a user. Stored as the Postgres enum `user_role` and serialized
/// in lowercase (`"student"`, `"supervisor"`, `"admin"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Student,
    Supervisor,
    Admin,
}

impl Role {
    /// Case-insensitive lookup used by the registration form, which historically sent
    /// roles as "Student", "SUPERVISOR", etc.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "supervisor" => Some(Role::Supervisor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Supervisor => "supervisor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ProjectStatus
///
/// Lifecycle state of a submission, stored as the Postgres enum `project_status`.
/// The transition rules live in `lifecycle.rs`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "project_status")]
#[ts(export)]
pub enum ProjectStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered account as exposed to the rest of the application. Carries no
/// password hash; see `UserCredentials`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    // FK to faculties.id. Students without a faculty cannot submit projects.
    pub faculty_id: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal row used only by the login flow: the public `User` plus the stored PHC hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// NewUser
///
/// Validated registration data handed to the repository. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub faculty_id: Option<i32>,
}

/// Category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Faculty
///
/// Static reference data. Users and projects point at a faculty by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Faculty {
    pub id: i32,
    pub name: String,
}

/// Project
///
/// A submission record from the `projects` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub category_id: i32,
    // FK to users.id (the submitter).
    pub submitted_by_id: i32,
    // Copied from the submitter at creation time.
    pub faculty_id: i32,
    pub github_link: Option<String>,
    pub demo_link: Option<String>,
    // Object key returned by the document upload flow.
    pub document_url: String,
    pub year: i32,
    pub status: ProjectStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ProjectListing
///
/// A project joined with the display names of its submitter, category and faculty.
/// Returned by every listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProjectListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,
    pub submitter_username: String,
    pub submitter_email: String,
    pub category_name: String,
    pub faculty_name: String,
}

/// NewProject
///
/// Fully resolved insert for a submission. Status and year are decided by the handler,
/// never by the client.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub category_id: i32,
    pub submitted_by_id: i32,
    pub faculty_id: i32,
    pub github_link: Option<String>,
    pub demo_link: Option<String>,
    pub document_url: String,
    pub year: i32,
    pub status: ProjectStatus,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for POST /api/auth/register. Required fields are optional at the serde
/// level so that a missing field produces our own validation message.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Case-insensitive; defaults to "student".
    pub role: Option<String>,
    pub faculty_id: Option<i32>,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateProjectRequest
///
/// Input payload for POST /api/projects. Any `status` or `year` sent by the client is
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_link: Option<String>,
    pub document_url: Option<String>,
}

/// UpdateStatusRequest
///
/// Input payload for PUT /api/projects/{id}/status.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateStatusRequest {
    #[schema(example = "Approved")]
    pub status: Option<String>,
}

/// DocumentUploadRequest
///
/// Input payload for POST /api/upload/document.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentUploadRequest {
    #[schema(example = "final_report.pdf")]
    pub filename: String,
    /// Must be `application/pdf`.
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

// --- Response Payloads (Output Schemas) ---

/// AuthResponse
///
/// Returned by register and login: the identity plus a freshly signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// UserProfile
///
/// Output schema for GET /api/auth/me, built from the identity resolved by the auth gate.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub faculty_id: Option<i32>,
}

/// StatusUpdateResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StatusUpdateResponse {
    pub message: String,
    pub project: Project,
}

/// DocumentUploadResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DocumentUploadResponse {
    /// Time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key to send back as `documentUrl` when submitting the project.
    pub resource_key: String,
}
