//! Integration tests for the rate limiter attachment hook.
//!
//! Exercises a router wrapped by the middleware with the in-memory counter
//! store; no Redis instance is required.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::config::AppConfig;
use runtime_config::rate_limit::store::{CounterStore, MemoryCounterStore, StoreError};
use runtime_config::rate_limit::{CounterDecision, Quota};
use runtime_config::RuntimeSettings;

fn settings() -> RuntimeSettings {
    let config = AppConfig::from_lookup(|key| match key {
        "POSTGRES_DB_NAME" => Some("analytics".to_string()),
        _ => None,
    })
    .unwrap();
    RuntimeSettings::from_config(&config).unwrap()
}

fn request_from(ip: [u8; 4]) -> Request<Body> {
    Request::builder()
        .uri("/")
        .extension(ConnectInfo(SocketAddr::from((ip, 4000))))
        .body(Body::empty())
        .unwrap()
}

fn app_with_memory_store() -> Router {
    let app = Router::new().route("/", get(|| async { "ok" }));
    settings().init_app_with_store(app, Arc::new(MemoryCounterStore::new()))
}

#[tokio::test]
async fn test_requests_under_quota_pass_through() {
    let app = app_with_memory_store();

    let response = app.oneshot(request_from([10, 0, 0, 1])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_hourly_quota_exhaustion_returns_429_per_client() {
    let app = app_with_memory_store();

    for _ in 0..50 {
        let response = app.clone().oneshot(request_from([10, 0, 0, 1])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(request_from([10, 0, 0, 1])).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // Other clients keep their own budget
    let response = app.oneshot(request_from([10, 0, 0, 2])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

struct FailingStore;

#[async_trait]
impl CounterStore for FailingStore {
    async fn check_and_increment(
        &self,
        _key: &str,
        _quota: &Quota,
    ) -> Result<CounterDecision, StoreError> {
        Err("connection refused".into())
    }
}

#[tokio::test]
async fn test_store_failure_fails_open() {
    let app = Router::new().route("/", get(|| async { "ok" }));
    let app = settings().init_app_with_store(app, Arc::new(FailingStore));

    let response = app.oneshot(request_from([10, 0, 0, 1])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
