//! Authentication Models
//! Mission: Claims, request identity and session payloads

use crate::auth::{errors::AuthError, password::MAX_PASSWORD_BYTES};
use crate::models::{PublicUser, UserRole};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid, // subject (user id)
    pub username: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Identity attached to a request once the access guard has validated its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthIdentity {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl AuthIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<Claims> for AuthIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthIdentity>()
            .cloned()
            .ok_or(AuthError::TokenNotProvided)
    }
}

/// Register request body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut problems = Vec::new();
        check_len(&mut problems, "full_name", &self.full_name, 2, 100);
        check_email(&mut problems, &self.email);
        check_len(&mut problems, "username", &self.username, 3, 100);
        check_password(&mut problems, &self.password);
        if let Some(url) = self.avatar_url.as_deref().filter(|u| !u.is_empty()) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                problems.push("avatar_url must be a valid URL".to_string());
            }
        }
        into_result(problems)
    }
}

/// Login request body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        let mut problems = Vec::new();
        check_email(&mut problems, &self.email);
        if self.password.is_empty() {
            problems.push("password is required".to_string());
        }
        into_result(problems)
    }
}

/// Register / login response; the token is duplicated here for non-cookie clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64, // seconds until expiration
    pub user: PublicUser,
}

pub(crate) fn check_len(problems: &mut Vec<String>, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len == 0 {
        problems.push(format!("{} is required", field));
    } else if len < min {
        problems.push(format!("{} must be at least {} characters", field, min));
    } else if len > max {
        problems.push(format!("{} must not exceed {} characters", field, max));
    }
}

/// Length in characters, plus the byte ceiling bcrypt can actually hash.
pub(crate) fn check_password(problems: &mut Vec<String>, password: &str) {
    check_len(problems, "password", password, 8, 100);
    if password.chars().count() <= 100 && password.len() > MAX_PASSWORD_BYTES {
        problems.push(format!(
            "password must not exceed {} bytes",
            MAX_PASSWORD_BYTES
        ));
    }
}

pub(crate) fn check_email(problems: &mut Vec<String>, email: &str) {
    if email.is_empty() {
        problems.push("email is required".to_string());
        return;
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        problems.push("email must be a valid email".to_string());
    }
}

fn into_result(problems: Vec<String>) -> Result<(), AuthError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(problems.join("; ")))
    }
}
