//! End-to-end session and project flows through the public router.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use kira_backend::{
    api::{build_router, AppState},
    config::{AppConfig, AuthConfig},
    store::Database,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

fn app() -> Router {
    let config = AppConfig {
        auth: AuthConfig::new("integration-secret", false).unwrap(),
        database_path: ":memory:".to_string(),
        port: 0,
        store_timeout: Duration::from_secs(5),
        cors_origin: "http://localhost:5173".to_string(),
    };
    build_router(AppState::new(&config, Database::in_memory().unwrap()).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(method: Method, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set a cookie")
        .to_str()
        .unwrap()
        .to_string()
}

fn registration(email: &str, username: &str) -> Value {
    json!({
        "full_name": "Ada Lovelace",
        "email": email,
        "username": username,
        "password": "longenough1",
    })
}

async fn register_token(app: &Router, email: &str, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json("/api/auth/register", registration(email, username)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn subject(app: &Router, token: &str) -> String {
    let response = app
        .clone()
        .oneshot(authed(Method::GET, "/api/auth/me", token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["user_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn register_then_login() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/register", registration("a@b.com", "ada")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));

    let registered = body_json(response).await;
    let token = registered["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());
    assert_eq!(registered["expires_in"], 86400);
    assert!(registered["user"].get("password").is_none());
    assert!(registered["user"].get("password_hash").is_none());
    let user_id = registered["user"]["id"].as_str().unwrap().to_string();

    let wrong = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let login = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "longenough1" }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let login_token = body_json(login).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    assert_eq!(subject(&app, &login_token).await, user_id);
    assert_eq!(subject(&app, &token).await, user_id);
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() {
    let app = app();
    register_token(&app, "a@b.com", "ada").await;

    let unknown = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "ghost@b.com", "password": "longenough1" }),
        ))
        .await
        .unwrap();
    let wrong = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "a@b.com", "password": "not-the-one" }),
        ))
        .await
        .unwrap();

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(unknown.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(unknown).await, body_json(wrong).await);
}

#[tokio::test]
async fn header_token_wins_over_cookie() {
    let app = app();
    let first = register_token(&app, "first@b.com", "first").await;
    let second = register_token(&app, "second@b.com", "second").await;

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", first))
        .header(header::COOKIE, format!("auth_token={}", second))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "first");

    let cookie_only = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("auth_token={}", second))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(cookie_only).await.unwrap();
    assert_eq!(body_json(response).await["username"], "second");
}

#[tokio::test]
async fn malformed_authorization_header_is_rejected() {
    let app = app();
    let token = register_token(&app, "a@b.com", "ada").await;

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Token {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error = body_json(response).await["error"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(error.starts_with("Unauthorized"));
}

#[tokio::test]
async fn logout_expires_cookie() {
    let app = app();
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("auth_token=;"));
    assert!(cookie.contains("Max-Age=-1"));
    assert_eq!(body_json(response).await["message"], "successfully logged out");
}

#[tokio::test]
async fn project_lifecycle_respects_ownership() {
    let app = app();
    let owner = register_token(&app, "owner@b.com", "owner").await;
    let stranger = register_token(&app, "stranger@b.com", "stranger").await;

    let created = app
        .clone()
        .oneshot(authed(
            Method::POST,
            "/api/projects",
            &owner,
            Some(json!({
                "name": "Kira",
                "description": "Issue tracking for small teams",
                "status": "active",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let project = body_json(created).await;
    let project_uri = format!("/api/projects/{}", project["id"].as_str().unwrap());
    assert_eq!(project["owner_id"].as_str().unwrap(), subject(&app, &owner).await);

    let fetched = app
        .clone()
        .oneshot(authed(Method::GET, &project_uri, &stranger, None))
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);

    let update = json!({
        "name": "Kira 2",
        "description": "Issue tracking for larger teams",
        "status": "inactive",
    });
    let hijack = app
        .clone()
        .oneshot(authed(Method::PUT, &project_uri, &stranger, Some(update.clone())))
        .await
        .unwrap();
    assert_eq!(hijack.status(), StatusCode::FORBIDDEN);

    let delete_attempt = app
        .clone()
        .oneshot(authed(Method::DELETE, &project_uri, &stranger, None))
        .await
        .unwrap();
    assert_eq!(delete_attempt.status(), StatusCode::FORBIDDEN);

    let updated = app
        .clone()
        .oneshot(authed(Method::PUT, &project_uri, &owner, Some(update)))
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(body_json(updated).await["status"], "inactive");

    let mine = app
        .clone()
        .oneshot(authed(Method::GET, "/api/projects/mine", &owner, None))
        .await
        .unwrap();
    assert_eq!(body_json(mine).await.as_array().unwrap().len(), 1);

    let deleted = app
        .clone()
        .oneshot(authed(Method::DELETE, &project_uri, &owner, None))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app
        .oneshot(authed(Method::GET, &project_uri, &owner, None))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_project_is_bad_request() {
    let app = app();
    let token = register_token(&app, "a@b.com", "ada").await;

    let response = app
        .oneshot(authed(
            Method::POST,
            "/api/projects",
            &token,
            Some(json!({ "name": "K", "description": "short", "status": "active" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
