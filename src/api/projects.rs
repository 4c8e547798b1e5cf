//! Project endpoints
//!
//! Any authenticated caller may read projects. Only the owner or an admin may
//! change or remove one.

use super::{ApiError, ApiState, Pagination};
use crate::auth::{models::check_len, AuthIdentity};
use crate::models::{Project, ProjectStatus};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Body for creating or replacing a project.
#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
}

impl ProjectRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();
        check_len(&mut problems, "name", &self.name, 2, 100);
        check_len(&mut problems, "description", &self.description, 10, 500);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::BadRequest(problems.join("; ")))
        }
    }
}

fn ensure_can_modify(identity: &AuthIdentity, project: &Project) -> Result<(), ApiError> {
    if project.owner_id == identity.user_id || identity.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Only the project owner can modify this project".to_string(),
        ))
    }
}

async fn load(state: &ApiState, id: Uuid) -> Result<Project, ApiError> {
    state
        .bounded(state.projects.get_by_id(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project {} not found", id)))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<ApiState>,
    identity: AuthIdentity,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let project = Project::new(
        payload.name,
        payload.description,
        payload.status,
        identity.user_id,
    );
    state.bounded(state.projects.create(&project)).await?;
    info!(project_id = %project.id, owner_id = %project.owner_id, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<ApiState>,
    _identity: AuthIdentity,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let (limit, offset) = page.resolve(10);
    let projects = state.bounded(state.projects.list(limit, offset)).await?;
    Ok(Json(projects))
}

/// GET /api/projects/mine
pub async fn my_projects(
    State(state): State<ApiState>,
    identity: AuthIdentity,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state
        .bounded(state.projects.list_by_owner(identity.user_id))
        .await?;
    Ok(Json(projects))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<ApiState>,
    _identity: AuthIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    load(&state, id).await.map(Json)
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<ApiState>,
    identity: AuthIdentity,
    Path(id): Path<Uuid>,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<Json<Project>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let mut project = load(&state, id).await?;
    ensure_can_modify(&identity, &project)?;

    project.name = payload.name;
    project.description = payload.description;
    project.status = payload.status;
    state.bounded(state.projects.update(&project)).await?;
    info!(project_id = %id, "Project updated");

    load(&state, id).await.map(Json)
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<ApiState>,
    identity: AuthIdentity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let project = load(&state, id).await?;
    ensure_can_modify(&identity, &project)?;

    state.bounded(state.projects.delete(id)).await?;
    info!(project_id = %id, deleted_by = %identity.user_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
