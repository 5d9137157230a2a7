//! # Rideline Shared Library
//!
//! This crate contains the data layer shared by the Rideline API server and
//! its tooling: connection pooling, migrations, the sequence allocator that
//! hands out entity ids, the database models, password hashing, and the
//! `Registrar` service that composes them into the registration workflows.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool, migration runner, and the sequence allocator
//! - `models`: Database models (users, addresses, rider vehicles)
//! - `auth`: Password hashing
//! - `registrar`: Entity creation and duplicate-phone guarding

pub mod auth;
pub mod db;
pub mod models;
pub mod registrar;

/// Current version of the Rideline shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
