//! Authentication Errors
//! Mission: One taxonomy for token, credential and persistence failures

use crate::store::StoreError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token not provided")]
    TokenNotProvided,
    #[error("invalid token")]
    InvalidToken,
    #[error("token has expired")]
    TokenExpired,
    #[error("invalid token claims")]
    InvalidClaims,
    /// Unknown account and wrong password collapse into this one variant.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    TokenSigning(String),
    #[error("storage did not respond in time")]
    PersistenceTimeout,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::TokenNotProvided
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InvalidClaims
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::PersistenceTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Hashing(_) | AuthError::TokenSigning(_) | AuthError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => AuthError::PersistenceTimeout,
            StoreError::Conflict(msg) => AuthError::Conflict(msg),
            other => AuthError::Storage(other),
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AuthError::Hashing(_) | AuthError::TokenSigning(_) | AuthError::Storage(_) => {
                error!("Auth internal error: {}", self);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
