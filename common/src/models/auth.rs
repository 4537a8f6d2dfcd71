//! Authentication models for the Superset security API.

use serde::{Deserialize, Serialize};

/// Request body for the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// API username.
    pub username: String,
    /// API password.
    pub password: String,
    /// Authentication provider.
    pub provider: String,
}

impl LoginRequest {
    /// Creates a login request against the database auth provider.
    pub fn db(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            provider: "db".to_string(),
        }
    }
}

/// Response body from the login endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests; absent on some failure modes.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Response body from the CSRF token endpoint.
#[derive(Debug, Deserialize)]
pub struct CsrfTokenResponse {
    /// The anti-forgery token; absent on some failure modes.
    #[serde(default)]
    pub result: Option<String>,
}
