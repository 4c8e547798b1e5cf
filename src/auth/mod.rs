//! Authentication Module
//! Mission: Password hashing, JWT sessions and the access guard for protected routes

pub mod api;
pub mod carrier;
pub mod errors;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod session;

pub use api::AuthState;
pub use carrier::CredentialCarrier;
pub use errors::AuthError;
pub use jwt::TokenCodec;
pub use middleware::{auth_middleware, AccessGuard};
pub use models::AuthIdentity;
pub use session::SessionService;
