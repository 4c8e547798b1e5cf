//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation
//!
//! Per request the guard moves Unauthenticated -> TokenExtracted -> TokenValidated
//! -> IdentityAttached, or stops at Rejected with a 401. Handlers behind it read the
//! caller through the [`AuthIdentity`] extractor and never see the raw token.

use crate::auth::{
    carrier::CredentialCarrier,
    errors::AuthError,
    jwt::TokenCodec,
    models::AuthIdentity,
};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// State handed to [`auth_middleware`].
#[derive(Clone)]
pub struct AccessGuard {
    codec: Arc<TokenCodec>,
    carrier: CredentialCarrier,
}

impl AccessGuard {
    pub fn new(codec: Arc<TokenCodec>, carrier: CredentialCarrier) -> Self {
        Self { codec, carrier }
    }

    /// Run the guard's checks against request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthIdentity, GuardRejection> {
        let token = self
            .carrier
            .extract(headers)
            .map_err(GuardRejection::Extract)?;

        let claims = self
            .codec
            .validate(&token)
            .map_err(GuardRejection::Validate)?;

        Ok(AuthIdentity::from(claims))
    }
}

/// Why the guard refused a request, tagged with the step that failed.
#[derive(Debug)]
pub enum GuardRejection {
    Extract(AuthError),
    Validate(AuthError),
}

impl GuardRejection {
    pub fn message(&self) -> String {
        match self {
            GuardRejection::Extract(e) => format!("Unauthorized, failed to get auth token: {}", e),
            GuardRejection::Validate(e) => format!("Invalid token: {}", e),
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": self.message() })),
        )
            .into_response()
    }
}

/// Auth middleware that validates JWT tokens
pub async fn auth_middleware(
    State(guard): State<AccessGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, GuardRejection> {
    let identity = guard.authenticate(req.headers()).map_err(|rejection| {
        debug!(path = %req.uri().path(), reason = %rejection.message(), "Request rejected by auth guard");
        rejection
    })?;

    // Add identity to request extensions so handlers can access it
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
