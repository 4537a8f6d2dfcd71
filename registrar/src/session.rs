//! Authenticated Superset API session.
//!
//! A session lives for exactly one registrar run. It is constructed by
//! logging in and fetching the anti-forgery token, and is dropped when the
//! run ends; no session state outlives the call.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use common::config::SupersetConfig;
use common::errors::{AppError, AppResult};
use common::models::{CsrfTokenResponse, LoginRequest, LoginResponse};

/// Header carrying the anti-forgery token on mutating requests.
const CSRF_HEADER: &str = "X-CSRFToken";

/// A short-lived authenticated session against one Superset instance.
pub struct SupersetSession {
    client: reqwest::Client,
    config: SupersetConfig,
    headers: HeaderMap,
}

impl SupersetSession {
    /// Logs in and fetches the CSRF token, returning a session whose
    /// requests carry both credentials.
    ///
    /// Any non-200 response or missing token aborts immediately; there are
    /// no retries.
    pub async fn establish(client: reqwest::Client, config: SupersetConfig) -> AppResult<Self> {
        let access_token = login(&client, &config).await?;
        tracing::info!(base_url = %config.base_url, "已登录 Superset");

        let csrf_token = fetch_csrf_token(&client, &config, &access_token).await?;
        tracing::debug!("已获取 CSRF 令牌");

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", access_token))?,
        );
        headers.insert(CSRF_HEADER, header_value(&csrf_token)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            config,
            headers,
        })
    }

    /// The database collection endpoint of this session's instance.
    pub fn database_endpoint(&self) -> String {
        self.config.database_endpoint()
    }

    /// GET request carrying the session credentials.
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url).headers(self.headers.clone())
    }

    /// POST request carrying the session credentials.
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url).headers(self.headers.clone())
    }
}

/// Submits credentials to the login endpoint and extracts the bearer token.
async fn login(client: &reqwest::Client, config: &SupersetConfig) -> AppResult<String> {
    let request = LoginRequest::db(config.username.clone(), config.password.clone());
    let response = client
        .post(config.login_endpoint())
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if status != StatusCode::OK {
        return Err(AppError::Authentication {
            status: status.as_u16(),
            body,
        });
    }

    let token = serde_json::from_str::<LoginResponse>(&body)
        .ok()
        .and_then(|r| r.access_token)
        .filter(|t| !t.is_empty());

    match token {
        Some(token) => Ok(token),
        None => Err(AppError::Authentication {
            status: status.as_u16(),
            body,
        }),
    }
}

/// Fetches the anti-forgery token with the bearer credential.
async fn fetch_csrf_token(
    client: &reqwest::Client,
    config: &SupersetConfig,
    access_token: &str,
) -> AppResult<String> {
    let response = client
        .get(config.csrf_token_endpoint())
        .bearer_auth(access_token)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if status != StatusCode::OK {
        return Err(AppError::CsrfToken {
            status: status.as_u16(),
            body,
        });
    }

    let token = serde_json::from_str::<CsrfTokenResponse>(&body)
        .ok()
        .and_then(|r| r.result)
        .filter(|t| !t.is_empty());

    match token {
        Some(token) => Ok(token),
        None => Err(AppError::CsrfToken {
            status: status.as_u16(),
            body,
        }),
    }
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        AppError::Config("remote API returned a token that is not a valid header value".to_string())
    })
}
