//! Middleware for observability.
//!
//! Authentication lives with the rest of the auth core in `crate::auth::middleware`.

pub mod logging;

pub use logging::request_logging;
