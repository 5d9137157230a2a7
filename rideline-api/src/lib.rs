//! # Rideline API Server Library
//!
//! This library provides the core functionality for the Rideline API server:
//! registration of riders and passengers, address and vehicle records, login,
//! and user CRUD.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
