use crate::models::{
    Category, Faculty, NewProject, NewUser, Project, ProjectListing, ProjectStatus, User,
    UserCredentials,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// Result type of every persistence call. Handlers convert `sqlx::Error` into a 500
/// through `AppError::Database`.
pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers and the auth
/// gate only ever see this trait, so tests can swap in an in-memory implementation.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Password hash is never selected here.
    async fn get_user(&self, id: i32) -> RepoResult<Option<User>>;
    async fn get_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>>;
    async fn email_exists(&self, email: &str) -> RepoResult<bool>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    // Newest first.
    async fn list_users(&self) -> RepoResult<Vec<User>>;

    // --- Projects ---
    async fn list_projects_by_status(&self, status: ProjectStatus) -> RepoResult<Vec<ProjectListing>>;
    async fn get_project(&self, id: i32) -> RepoResult<Option<Project>>;
    async fn create_project(&self, project: NewProject) -> RepoResult<Project>;
    // Returns None when the project does not exist.
    async fn set_project_status(&self, id: i32, status: ProjectStatus) -> RepoResult<Option<Project>>;

    // --- Reference Data ---
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: i32) -> RepoResult<Option<Category>>;
    async fn list_faculties(&self) -> RepoResult<Vec<Faculty>>;
    async fn get_faculty(&self, id: i32) -> RepoResult<Option<Faculty>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, username, email, role, faculty_id, created_at";

const PROJECT_COLUMNS: &str = r#"id, title, description, category_id, submitted_by_id, faculty_id,
    github_link, demo_link, document_url, year, status, created_at, updated_at"#;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i32) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// get_credentials_by_email
    ///
    /// The only query that reads `password_hash`. Used by login.
    async fn get_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
    }

    /// create_user
    ///
    /// The `users.email` unique index backs up the `email_exists` pre-check when two
    /// registrations race.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (username, email, password_hash, role, faculty_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role)
        .bind(user.faculty_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// list_projects_by_status
    ///
    /// Joins submitter, category and faculty so listings are UI ready in one round trip.
    async fn list_projects_by_status(&self, status: ProjectStatus) -> RepoResult<Vec<ProjectListing>> {
        sqlx::query_as::<_, ProjectListing>(
            r#"
            SELECT
                p.id, p.title, p.description, p.category_id, p.submitted_by_id, p.faculty_id,
                p.github_link, p.demo_link, p.document_url, p.year, p.status,
                p.created_at, p.updated_at,
                u.username AS submitter_username,
                u.email AS submitter_email,
                c.name AS category_name,
                f.name AS faculty_name
            FROM projects p
            JOIN users u ON p.submitted_by_id = u.id
            JOIN categories c ON p.category_id = c.id
            JOIN faculties f ON p.faculty_id = f.id
            WHERE p.status = $1
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_project(&self, id: i32) -> RepoResult<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_project(&self, project: NewProject) -> RepoResult<Project> {
        sqlx::query_as::<_, Project>(&format!(
            r#"INSERT INTO projects (
                   title, description, category_id, submitted_by_id, faculty_id,
                   github_link, demo_link, document_url, year, status
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING {PROJECT_COLUMNS}"#
        ))
        .bind(project.title)
        .bind(project.description)
        .bind(project.category_id)
        .bind(project.submitted_by_id)
        .bind(project.faculty_id)
        .bind(project.github_link)
        .bind(project.demo_link)
        .bind(project.document_url)
        .bind(project.year)
        .bind(project.status)
        .fetch_one(&self.pool)
        .await
    }

    /// set_project_status
    ///
    /// Unconditional write: concurrent reviews of the same project are last-write-wins.
    async fn set_project_status(&self, id: i32, status: ProjectStatus) -> RepoResult<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"UPDATE projects SET status = $1, updated_at = NOW()
               WHERE id = $2
               RETURNING {PROJECT_COLUMNS}"#
        ))
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    async fn get_category(&self, id: i32) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_faculties(&self) -> RepoResult<Vec<Faculty>> {
        sqlx::query_as::<_, Faculty>("SELECT id, name FROM faculties ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    async fn get_faculty(&self, id: i32) -> RepoResult<Option<Faculty>> {
        sqlx::query_as::<_, Faculty>("SELECT id, name FROM faculties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
