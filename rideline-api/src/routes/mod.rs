/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login endpoints
/// - `users`: User CRUD endpoints
/// - `addresses`: Address endpoints

pub mod addresses;
pub mod auth;
pub mod health;
pub mod users;
