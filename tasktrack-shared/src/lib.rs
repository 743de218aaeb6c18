//! # TaskTrack Shared Library
//!
//! Domain types, persistence and business rules used by the TaskTrack API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: users, tasks and comments
//! - `repository`: persistence ports with Postgres and in-memory adapters
//! - `db`: connection pool and migrations
//! - `auth`: password hashing, bearer tokens, request auth context
//! - `services`: identity resolution, user directory, task and comment rules
//! - `projection`: response-shaped views of the models

pub mod auth;
pub mod db;
pub mod models;
pub mod projection;
pub mod repository;
pub mod services;

/// Current version of the TaskTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
