//! Startup Configuration
//! Mission: Read process environment once and hand immutable settings to the core

use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Name of the service stamped into every issued token.
pub const TOKEN_ISSUER: &str = "kira-auth-service";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set; refusing to start without a signing secret")]
    MissingSecret,
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings the authentication core needs: signing secret and environment mode.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub development: bool,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, development: bool) -> Result<Self, ConfigError> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self {
            jwt_secret,
            development,
        })
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("development", &self.development)
            .finish()
    }
}

/// Process-wide application configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub database_path: String,
    pub port: u16,
    pub store_timeout: Duration,
    pub cors_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        let development = get("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        let database_path = get("DATABASE_PATH").unwrap_or_else(|| "./kira.db".to_string());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let store_timeout_secs = match get("STORE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|&v| v > 0)
                .ok_or(ConfigError::Invalid {
                    key: "STORE_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => 5,
        };

        let cors_origin =
            get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            auth: AuthConfig::new(jwt_secret, development)?,
            database_path,
            port,
            store_timeout: Duration::from_secs(store_timeout_secs),
            cors_origin,
        })
    }
}
