use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{projects, users, ApiState};
use crate::auth::{
    api as auth_api, auth_middleware, AccessGuard, AuthState, CredentialCarrier, SessionService,
    TokenCodec,
};
use crate::config::{AppConfig, ConfigError};
use crate::middleware::request_logging;
use crate::store::{Database, SqliteProjectStore, SqliteUserStore};

/// Everything the router needs, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub api: ApiState,
    pub guard: AccessGuard,
    pub cors_origin: HeaderValue,
}

impl AppState {
    pub fn new(config: &AppConfig, db: Database) -> Result<Self, ConfigError> {
        let cors_origin =
            HeaderValue::from_str(&config.cors_origin).map_err(|_| ConfigError::Invalid {
                key: "CORS_ORIGIN",
                value: config.cors_origin.clone(),
            })?;

        let codec = Arc::new(TokenCodec::new(&config.auth));
        let carrier = CredentialCarrier::new(&config.auth);

        let users = Arc::new(SqliteUserStore::new(db.clone()));
        let projects = Arc::new(SqliteProjectStore::new(db));

        let sessions = Arc::new(SessionService::new(
            users.clone(),
            codec.clone(),
            carrier.clone(),
            config.store_timeout,
        ));

        Ok(Self {
            auth: AuthState::new(sessions),
            api: ApiState {
                users,
                projects,
                store_timeout: config.store_timeout,
            },
            guard: AccessGuard::new(codec, carrier),
            cors_origin,
        })
    }
}

/// Create the API router
pub fn build_router(state: AppState) -> Router {
    let guard = middleware::from_fn_with_state(state.guard.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/logout", post(auth_api::logout))
        .with_state(state.auth.clone());

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route("/api/users", get(users::list_users))
        .route("/api/users/me", get(users::get_me).put(users::update_me))
        .route(
            "/api/users/by-username/:username",
            get(users::get_by_username),
        )
        .route("/api/users/:id", delete(users::delete_user))
        .route(
            "/api/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route("/api/projects/mine", get(projects::my_projects))
        .route(
            "/api/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route_layer(guard)
        .with_state(state.api.clone());

    let cors = CorsLayer::new()
        .allow_origin(state.cors_origin.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
