//! Shared data models for the Superset REST API.

pub mod auth;
pub mod database;

// Re-export commonly used types
pub use auth::{CsrfTokenResponse, LoginRequest, LoginResponse};
pub use database::{
    CreateDatabaseRequest, DatabaseFilter, DatabaseSearchQuery, DatabaseSearchResponse,
};
