//! Credential Carrier
//! Mission: Move session tokens between HTTP messages and the auth core

use crate::auth::{errors::AuthError, jwt::TOKEN_TTL_SECS};
use crate::config::AuthConfig;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Session cookie name.
pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, Clone)]
pub struct CredentialCarrier {
    secure: bool,
}

impl CredentialCarrier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secure: !config.development,
        }
    }

    /// Pull the token from `Authorization: Bearer <token>`, falling back to the session cookie.
    pub fn extract(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        if let Some(value) = headers.get(AUTHORIZATION) {
            let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
            let parts: Vec<&str> = value.split(' ').collect();
            if parts.len() != 2 || parts[0] != "Bearer" || parts[1].is_empty() {
                return Err(AuthError::InvalidToken);
            }
            return Ok(parts[1].to_string());
        }

        CookieJar::from_headers(headers)
            .get(AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::TokenNotProvided)
    }

    /// Set the session cookie on the outgoing response.
    pub fn attach(&self, jar: CookieJar, token: &str) -> CookieJar {
        jar.add(self.cookie(token.to_string(), TOKEN_TTL_SECS))
    }

    /// Overwrite the session cookie so the client drops it immediately.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.cookie(String::new(), -1))
    }

    fn cookie(&self, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((AUTH_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }
}
