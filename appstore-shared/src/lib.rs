//! # AppStore Shared Library
//!
//! This crate contains the data layer and business rules of the app
//! marketplace: database access, the user/app/order models, and the
//! token authentication primitives used by the API server.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, opaque tokens, request auth context

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the AppStore shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
