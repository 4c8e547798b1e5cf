//! Identity Session Flow
//! Mission: Register, log in and log out by composing hasher, codec and carrier

use crate::auth::{
    carrier::CredentialCarrier,
    errors::AuthError,
    jwt::TokenCodec,
    models::{AuthResponse, LoginRequest, RegisterRequest},
    password,
};
use crate::models::{PublicUser, User};
use crate::store::{with_deadline, UserRepository};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct SessionService {
    users: Arc<dyn UserRepository>,
    codec: Arc<TokenCodec>,
    carrier: CredentialCarrier,
    store_timeout: Duration,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        codec: Arc<TokenCodec>,
        carrier: CredentialCarrier,
        store_timeout: Duration,
    ) -> Self {
        Self {
            users,
            codec,
            carrier,
            store_timeout,
        }
    }

    /// Create an account. The token is minted only after the account is stored.
    pub async fn register(
        &self,
        jar: CookieJar,
        req: RegisterRequest,
    ) -> Result<(CookieJar, AuthResponse), AuthError> {
        req.validate()?;

        let plain = req.password;
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;

        let avatar_url = req.avatar_url.filter(|url| !url.is_empty());
        let user = User::new(req.full_name, req.email, req.username, password_hash, avatar_url);

        with_deadline(self.store_timeout, self.users.create(&user)).await?;

        let (token, expires_in) = self.codec.mint(&user)?;
        info!(user_id = %user.id, "User registered");

        Ok(self.issue(jar, token, expires_in, &user))
    }

    /// Log in by email and password. Unknown email and wrong password fail identically.
    pub async fn login(
        &self,
        jar: CookieJar,
        req: LoginRequest,
    ) -> Result<(CookieJar, AuthResponse), AuthError> {
        req.validate()?;

        let found = with_deadline(self.store_timeout, self.users.get_by_email(&req.email)).await?;

        let plain = req.password;
        let (user, valid) = tokio::task::spawn_blocking(move || match found {
            Some(user) => {
                let valid = password::verify_password(&user.password_hash, &plain);
                (Some(user), valid)
            }
            None => {
                password::burn_verification(&plain);
                (None, false)
            }
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let user = match (user, valid) {
            (Some(user), true) => user,
            (user, _) => {
                if let Some(user) = user {
                    warn!(user_id = %user.id, "Failed login attempt");
                }
                return Err(AuthError::InvalidCredentials);
            }
        };

        let (token, expires_in) = self.codec.mint(&user)?;
        info!(user_id = %user.id, "Login successful");

        Ok(self.issue(jar, token, expires_in, &user))
    }

    /// Drop the session cookie. Needs no token and always succeeds.
    pub fn logout(&self, jar: CookieJar) -> CookieJar {
        self.carrier.clear(jar)
    }

    fn issue(
        &self,
        jar: CookieJar,
        token: String,
        expires_in: i64,
        user: &User,
    ) -> (CookieJar, AuthResponse) {
        let jar = self.carrier.attach(jar, &token);
        (
            jar,
            AuthResponse {
                token,
                expires_in,
                user: PublicUser::from(user),
            },
        )
    }
}
