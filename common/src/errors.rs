//! Application error taxonomy.
//!
//! Fatal errors abort the current run; every variant that wraps a remote
//! response carries the upstream status and raw body verbatim so operators
//! can diagnose failures without re-running with extra verbosity.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Login was rejected or returned no usable access token.
    #[error("failed to log in to Superset (HTTP {status}): {body}")]
    Authentication {
        /// HTTP status of the login response.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The CSRF token could not be fetched or was empty.
    #[error("failed to fetch CSRF token (HTTP {status}): {body}")]
    CsrfToken {
        /// HTTP status of the CSRF response.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A state-mutating API call was rejected.
    #[error("Superset API request failed (HTTP {status}): {body}")]
    RemoteApi {
        /// HTTP status of the failed response.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Transport-level failure: connect, timeout, or body decode.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A request payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request payload failed validation before being sent.
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl AppError {
    /// True for errors raised before any network call was made.
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}
