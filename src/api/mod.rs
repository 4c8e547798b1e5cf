//! Resource APIs
//! Mission: Protected user and project endpoints behind the access guard

pub mod projects;
pub mod routes;
pub mod users;

use crate::auth::AuthError;
use crate::store::{with_deadline, ProjectRepository, StoreError, UserRepository};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use routes::{build_router, AppState};

/// Repositories plus the deadline every call runs under.
#[derive(Clone)]
pub struct ApiState {
    pub users: Arc<dyn UserRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub store_timeout: Duration,
}

impl ApiState {
    pub async fn bounded<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        Ok(with_deadline(self.store_timeout, fut).await?)
    }
}

/// `?limit=&offset=` query, shared by list endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Pagination {
    pub const MAX_LIMIT: u32 = 100;

    pub fn resolve(&self, default_limit: u32) -> (u32, u32) {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }
}

// ===== Error Handling =====

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    Timeout,
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Timeout => ApiError::Timeout,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::PersistenceTimeout => ApiError::Timeout,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "storage did not respond in time".to_string(),
            ),
            ApiError::Internal(err) => {
                tracing::error!("Internal API error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
