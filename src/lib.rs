//! Kira Backend Library
//!
//! Authentication core plus the user and project APIs it protects.
//! Exposed as a library so the binary and integration tests share one router.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod models;
pub mod store;
