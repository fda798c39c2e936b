//! # GymTrack Shared Library
//!
//! This crate contains the types and storage logic shared by the GymTrack
//! API server, the balance accrual worker, and the export tool.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Database models (users, equipment, usage records, wins)
//! - `auth`: Password hashing, JWT tokens, and the request auth context

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the GymTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
