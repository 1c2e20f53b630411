use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    config::AppConfig,
    error::AppError,
    models::{Role, User, UserProfile},
    repository::RepositoryState,
};

/// Fixed validity window of every issued token.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Claims
///
/// Payload of the bearer tokens issued at register/login and validated on every
/// authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the `users.id` of the holder.
    pub sub: i32,
    /// Role at issuance. Informational only: the gate reloads the role from the database.
    pub role: Role,
    /// Expiration Time (exp).
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Inserted into the request
/// extensions by `auth_middleware` and read back by handlers and the role gate.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub faculty_id: Option<i32>,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            faculty_id: user.faculty_id,
        }
    }
}

impl From<AuthUser> for UserProfile {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            faculty_id: user.faculty_id,
        }
    }
}

// --- Tokens ---

/// issue_token
///
/// Signs an HS256 token for `user_id` valid for `TOKEN_TTL_DAYS` from now.
pub fn issue_token(user_id: i32, role: Role, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("JWT encoding failed: {e}")))
}

/// decode_token
///
/// Verifies signature and expiry. Every failure kind collapses to the same
/// `Unauthorized` so callers cannot probe why a token was refused.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                kind => tracing::debug!("rejected token: {:?}", kind),
            }
            AppError::Unauthorized("Not authorized, token failed".to_string())
        })
}

/// Extracts the credential from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// --- Passwords ---

/// Hashes a password into an argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Checks a password against a stored PHC string. A malformed stored hash counts as a
/// mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("stored password hash is unreadable: {}", e);
            false
        }
    }
}

// --- Auth Gate ---

/// authenticate
///
/// The auth gate proper:
/// 1. Token Extraction: missing or non-Bearer header is "no token".
/// 2. Token Validation: signature and expiry against the shared secret.
/// 3. DB Lookup: the subject must still exist, and its current role and faculty are
///    loaded from the database rather than trusted from the token.
pub async fn authenticate(
    headers: &HeaderMap,
    config: &AppConfig,
    repo: &RepositoryState,
) -> Result<AuthUser, AppError> {
    let token = bearer_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    let claims = decode_token(token, &config.jwt_secret)?;

    let user = repo
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authorized, user not found".to_string()))?;

    Ok(AuthUser::from(user))
}

/// auth_middleware
///
/// First stage of the protected pipeline. Runs the auth gate and attaches the resolved
/// identity to the request extensions, or short-circuits with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(request.headers(), &state.config, &state.repo).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// AuthUser Extractor Implementation
///
/// Reuses the identity attached by `auth_middleware` when present. Otherwise runs the
/// auth gate itself, so a handler taking `AuthUser` is protected even when mounted
/// without the middleware.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        authenticate(&parts.headers, &config, &repo).await
    }
}

// --- Role Gate ---

/// AllowedRoles
///
/// The allow-list of a route. Used as the state of `role_gate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllowedRoles(pub &'static [Role]);

pub const ADMIN_ONLY: AllowedRoles = AllowedRoles(&[Role::Admin]);
pub const REVIEWERS: AllowedRoles = AllowedRoles(&[Role::Supervisor, Role::Admin]);
pub const SUBMITTERS: AllowedRoles = AllowedRoles(&[Role::Student, Role::Supervisor, Role::Admin]);

impl AllowedRoles {
    pub fn permits(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Pure check of an (optional) identity against the allow-list.
    pub fn authorize(&self, identity: Option<&AuthUser>) -> Result<(), AppError> {
        let user = identity.ok_or_else(|| {
            AppError::Forbidden("Access denied. User authentication context is missing.".to_string())
        })?;

        if self.permits(user.role) {
            Ok(())
        } else {
            tracing::warn!(user_id = user.id, role = %user.role, "role not permitted for route");
            Err(AppError::Forbidden(format!(
                "Access denied. Role ({}) is not authorized for this operation.",
                user.role
            )))
        }
    }
}

/// role_gate
///
/// Second stage of the protected pipeline. Must be layered inside `auth_middleware`.
pub async fn role_gate(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    allowed.authorize(request.extensions().get::<AuthUser>())?;
    Ok(next.run(request).await)
}
