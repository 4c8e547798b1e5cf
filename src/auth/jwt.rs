//! JWT Token Codec
//! Mission: Mint and validate signed, expiring identity tokens

use crate::auth::{errors::AuthError, models::Claims};
use crate::config::{AuthConfig, TOKEN_ISSUER};
use crate::models::{User, UserRole};
use chrono::Utc;
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

/// Token lifetime.
pub const TOKEN_TTL_SECS: i64 = 24 * 3600;

/// The only accepted signing scheme.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims exactly as decoded, before required fields are checked.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    username: Option<String>,
    role: Option<String>,
    iat: Option<i64>,
    exp: Option<i64>,
    iss: Option<String>,
}

/// JWT codec for token operations
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();

        // Expiry and issuer are checked below against an explicit clock.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a token for a user. Returns the token and its lifetime in seconds.
    pub fn mint(&self, user: &User) -> Result<(String, i64), AuthError> {
        self.mint_at(user, Utc::now().timestamp())
    }

    pub fn mint_at(&self, user: &User, now: i64) -> Result<(String, i64), AuthError> {
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            iss: TOKEN_ISSUER.to_string(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenSigning(e.to_string()))?;

        debug!(user_id = %user.id, "Minted token, expires in {}s", TOKEN_TTL_SECS);

        Ok((token, TOKEN_TTL_SECS))
    }

    /// Validate a token and extract claims
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        // Header problems are never claim problems.
        decode_header(token).map_err(|_| AuthError::InvalidToken)?;

        let raw = decode::<RawClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims,
                _ => AuthError::InvalidToken,
            })?
            .claims;

        let exp = raw.exp.ok_or(AuthError::InvalidClaims)?;
        if now >= exp {
            return Err(AuthError::TokenExpired);
        }

        let claims = required_claims(raw, exp)?;
        debug!(user_id = %claims.sub, "Validated token");
        Ok(claims)
    }
}

fn required_claims(raw: RawClaims, exp: i64) -> Result<Claims, AuthError> {
    let sub = raw
        .sub
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or(AuthError::InvalidClaims)?;
    let username = raw
        .username
        .filter(|u| !u.is_empty())
        .ok_or(AuthError::InvalidClaims)?;
    let role = raw
        .role
        .as_deref()
        .and_then(|r| r.parse::<UserRole>().ok())
        .ok_or(AuthError::InvalidClaims)?;
    let iat = raw.iat.ok_or(AuthError::InvalidClaims)?;
    let iss = raw
        .iss
        .filter(|i| i == TOKEN_ISSUER)
        .ok_or(AuthError::InvalidClaims)?;

    Ok(Claims {
        sub,
        username,
        role,
        iat,
        exp,
        iss,
    })
}
