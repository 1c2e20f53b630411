#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use project_portal::{
    AppConfig, AppState,
    auth::{self, AuthUser},
    models::{
        Category, Faculty, NewProject, NewUser, Project, ProjectListing, ProjectStatus, Role,
        User, UserCredentials,
    },
    repository::{RepoResult, Repository},
    storage::MockStorageService,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

// --- In-Memory Repository ---

#[derive(Default)]
struct Tables {
    // (user, password_hash)
    users: Vec<(User, String)>,
    projects: Vec<Project>,
    categories: Vec<Category>,
    faculties: Vec<Faculty>,
}

/// MemoryRepository
///
/// A `Repository` backed by vectors behind a mutex. Ids are assigned sequentially from 1,
/// mirroring the SERIAL columns of the real schema.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    /// When true, every call fails as if the database were unreachable.
    pub fail: bool,
}

pub const ICT_FACULTY: i32 = 1;
pub const WEB_CATEGORY: i32 = 1;

impl MemoryRepository {
    /// Repository pre-loaded with the same reference data the seed migration inserts.
    pub fn seeded() -> Self {
        let repo = Self::default();
        {
            let mut tables = repo.tables.lock().unwrap();
            tables.faculties = vec![
                Faculty { id: 1, name: "ICT".to_string() },
                Faculty { id: 2, name: "Engineering".to_string() },
            ];
            tables.categories = vec![
                Category { id: 1, name: "Web Application".to_string() },
                Category { id: 2, name: "Machine Learning".to_string() },
            ];
        }
        repo
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::seeded() }
    }

    fn check(&self) -> RepoResult<()> {
        if self.fail {
            Err(sqlx::Error::Protocol("simulated database outage".to_string()))
        } else {
            Ok(())
        }
    }

    /// Inserts a user directly, bypassing the registration handler.
    pub fn insert_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        faculty_id: Option<i32>,
    ) -> User {
        let mut tables = self.tables.lock().unwrap();
        let user = User {
            id: tables.users.len() as i32 + 1,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            role,
            faculty_id,
            created_at: Utc::now(),
        };
        let hash = auth::hash_password(password).unwrap();
        tables.users.push((user.clone(), hash));
        user
    }

    /// Inserts a project directly in the given status.
    pub fn insert_project(&self, submitter: &User, title: &str, status: ProjectStatus) -> Project {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now() + Duration::milliseconds(tables.projects.len() as i64);
        let project = Project {
            id: tables.projects.len() as i32 + 1,
            title: title.to_string(),
            description: format!("{title} description"),
            category_id: WEB_CATEGORY,
            submitted_by_id: submitter.id,
            faculty_id: submitter.faculty_id.unwrap_or(ICT_FACULTY),
            github_link: None,
            demo_link: None,
            document_url: "documents/project.pdf".to_string(),
            year: 2024,
            status,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());
        project
    }

    pub fn project_status(&self, id: i32) -> Option<ProjectStatus> {
        let tables = self.tables.lock().unwrap();
        tables.projects.iter().find(|p| p.id == id).map(|p| p.status)
    }

    pub fn project_count(&self) -> usize {
        self.tables.lock().unwrap().projects.len()
    }

    pub fn remove_user(&self, id: i32) {
        self.tables.lock().unwrap().users.retain(|(u, _)| u.id != id);
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: i32) -> RepoResult<Option<User>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn get_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                user: u.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().any(|(u, _)| u.email == email))
    }

    async fn create_user(&self, new_user: NewUser) -> RepoResult<User> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let user = User {
            id: tables.users.len() as i32 + 1,
            username: new_user.username,
            email: new_user.email,
            role: new_user.role,
            faculty_id: new_user.faculty_id,
            created_at: Utc::now(),
        };
        tables.users.push((user.clone(), new_user.password_hash));
        Ok(user)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().rev().map(|(u, _)| u.clone()).collect())
    }

    async fn list_projects_by_status(&self, status: ProjectStatus) -> RepoResult<Vec<ProjectListing>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut listings: Vec<ProjectListing> = tables
            .projects
            .iter()
            .filter(|p| p.status == status)
            .map(|p| {
                let submitter = tables
                    .users
                    .iter()
                    .find(|(u, _)| u.id == p.submitted_by_id)
                    .map(|(u, _)| u.clone())
                    .unwrap_or_default();
                ProjectListing {
                    project: p.clone(),
                    submitter_username: submitter.username,
                    submitter_email: submitter.email,
                    category_name: tables
                        .categories
                        .iter()
                        .find(|c| c.id == p.category_id)
                        .map(|c| c.name.clone())
                        .unwrap_or_default(),
                    faculty_name: tables
                        .faculties
                        .iter()
                        .find(|f| f.id == p.faculty_id)
                        .map(|f| f.name.clone())
                        .unwrap_or_default(),
                }
            })
            .collect();
        listings.sort_by(|a, b| b.project.created_at.cmp(&a.project.created_at));
        Ok(listings)
    }

    async fn get_project(&self, id: i32) -> RepoResult<Option<Project>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn create_project(&self, new_project: NewProject) -> RepoResult<Project> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let project = Project {
            id: tables.projects.len() as i32 + 1,
            title: new_project.title,
            description: new_project.description,
            category_id: new_project.category_id,
            submitted_by_id: new_project.submitted_by_id,
            faculty_id: new_project.faculty_id,
            github_link: new_project.github_link,
            demo_link: new_project.demo_link,
            document_url: new_project.document_url,
            year: new_project.year,
            status: new_project.status,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(project.clone());
        Ok(project)
    }

    async fn set_project_status(&self, id: i32, status: ProjectStatus) -> RepoResult<Option<Project>> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.projects.iter_mut().find(|p| p.id == id).map(|p| {
            p.status = status;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().categories.clone())
    }

    async fn get_category(&self, id: i32) -> RepoResult<Option<Category>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_faculties(&self) -> RepoResult<Vec<Faculty>> {
        self.check()?;
        Ok(self.tables.lock().unwrap().faculties.clone())
    }

    async fn get_faculty(&self, id: i32) -> RepoResult<Option<Faculty>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.faculties.iter().find(|f| f.id == id).cloned())
    }
}

// --- State & Request Helpers ---

pub fn test_state(repo: Arc<MemoryRepository>) -> AppState {
    test_state_with_storage(repo, MockStorageService::new())
}

pub fn test_state_with_storage(repo: Arc<MemoryRepository>, storage: MockStorageService) -> AppState {
    AppState {
        repo,
        storage: Arc::new(storage),
        config: AppConfig::default(),
    }
}

/// Signs a token for `user` with the default test secret.
pub fn token_for(user: &User) -> String {
    auth::issue_token(user.id, user.role, &AppConfig::default().jwt_secret).unwrap()
}

pub fn bearer(user: &User) -> String {
    format!("Bearer {}", token_for(user))
}

pub fn auth_user(user: &User) -> AuthUser {
    AuthUser::from(user.clone())
}

/// Builds a JSON request, optionally authenticated as `user`.
pub fn json_request(method: &str, uri: &str, user: Option<&User>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends one request through the router and returns the status and the JSON body
/// (`Value::Null` for empty or non-JSON bodies).
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
