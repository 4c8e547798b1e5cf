//! User endpoints

use super::{ApiError, ApiState, Pagination};
use crate::auth::{
    models::{check_email, check_len, check_password},
    password, AuthError, AuthIdentity,
};
use crate::models::PublicUser;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Body of `PUT /api/users/me`. Omitted optional fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();
        check_len(&mut problems, "full_name", &self.full_name, 2, 100);
        check_email(&mut problems, &self.email);
        if let Some(password) = &self.password {
            check_password(&mut problems, password);
        }
        if let Some(url) = self.avatar_url.as_deref().filter(|u| !u.is_empty()) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                problems.push("avatar_url must be a valid URL".to_string());
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::BadRequest(problems.join("; ")))
        }
    }
}

/// GET /api/users/me
pub async fn get_me(
    State(state): State<ApiState>,
    identity: AuthIdentity,
) -> Result<Json<PublicUser>, ApiError> {
    state
        .bounded(state.users.get_by_id(identity.user_id))
        .await?
        .map(|user| Json(PublicUser::from(&user)))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// PUT /api/users/me
pub async fn update_me(
    State(state): State<ApiState>,
    identity: AuthIdentity,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let mut user = state
        .bounded(state.users.get_by_id(identity.user_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Some(plain) = payload.password {
        user.password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;
    }
    user.full_name = payload.full_name;
    user.email = payload.email;
    if let Some(url) = payload.avatar_url {
        user.avatar_url = Some(url).filter(|u| !u.is_empty());
    }

    state.bounded(state.users.update(&user)).await?;
    info!(user_id = %user.id, "Updated user profile");

    // Re-read so the response carries the stored updated_at.
    state
        .bounded(state.users.get_by_id(user.id))
        .await?
        .map(|user| Json(PublicUser::from(&user)))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// GET /api/users (admin only)
pub async fn list_users(
    State(state): State<ApiState>,
    identity: AuthIdentity,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    if !identity.is_admin() {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    let (limit, offset) = page.resolve(10);
    let users = state.bounded(state.users.list(limit, offset)).await?;

    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

/// GET /api/users/by-username/:username
pub async fn get_by_username(
    State(state): State<ApiState>,
    _identity: AuthIdentity,
    Path(username): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    state
        .bounded(state.users.get_by_username(&username))
        .await?
        .map(|user| Json(PublicUser::from(&user)))
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", username)))
}

/// DELETE /api/users/:id (self or admin)
pub async fn delete_user(
    State(state): State<ApiState>,
    identity: AuthIdentity,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if identity.user_id != user_id && !identity.is_admin() {
        return Err(ApiError::Forbidden(
            "Cannot delete another user's account".to_string(),
        ));
    }

    state.bounded(state.users.delete(user_id)).await?;
    info!(user_id = %user_id, deleted_by = %identity.user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
