//! Authentication API Endpoints
//! Mission: Expose register, login, logout and current identity over HTTP

use crate::auth::{
    errors::AuthError,
    models::{AuthIdentity, AuthResponse, LoginRequest, RegisterRequest},
    session::SessionService,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionService>,
}

impl AuthState {
    pub fn new(sessions: Arc<SessionService>) -> Self {
        Self { sessions }
    }
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AuthError> {
    let Json(payload) = payload?;
    let (jar, response) = state.sessions.register(jar, payload).await?;
    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    let Json(payload) = payload?;
    let (jar, response) = state.sessions.login(jar, payload).await?;
    Ok((jar, Json(response)))
}

/// Logout endpoint - POST /api/auth/logout
pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    (
        state.sessions.logout(jar),
        Json(json!({ "message": "successfully logged out" })),
    )
}

/// Get current identity - GET /api/auth/me
/// Built from the validated token, no database lookup
pub async fn me(identity: AuthIdentity) -> Json<AuthIdentity> {
    Json(identity)
}
