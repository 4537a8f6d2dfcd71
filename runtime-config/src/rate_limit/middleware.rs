//! Rate limit enforcement middleware.
//!
//! Wraps the hosting application's router; every request is keyed, checked
//! against each declared quota in order, and answered with HTTP 429 plus a
//! `Retry-After` header once a quota is exhausted.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Router;

use super::store::{CounterStore, RedisCounterStore};
use super::{CounterDecision, KeyStrategy, RateLimitPolicy};

/// Shared limiter handle: a policy bound to a counter store.
#[derive(Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Binds a policy to an explicit counter store.
    pub fn new(policy: RateLimitPolicy, store: Arc<dyn CounterStore>) -> Self {
        Self { policy, store }
    }

    /// Binds a policy to a Redis store built from its own storage URI.
    pub fn redis(policy: RateLimitPolicy) -> Result<Self, redis::RedisError> {
        let store = RedisCounterStore::new(policy.storage_uri())?;
        Ok(Self::new(policy, Arc::new(store)))
    }

    /// The policy this limiter enforces.
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Checks every quota in declaration order; the first exhausted quota
    /// denies the request.
    ///
    /// A store failure never blocks traffic: the affected quota is skipped
    /// and the failure logged.
    pub async fn check(&self, key: &str) -> CounterDecision {
        let mut last = CounterDecision::unlimited();
        for quota in self.policy.quotas() {
            match self.store.check_and_increment(key, quota).await {
                Ok(decision) if !decision.allowed => {
                    tracing::debug!(key = %key, quota = %quota, "请求超出限流配额");
                    return decision;
                }
                Ok(decision) => last = decision,
                Err(e) => {
                    tracing::warn!(error = %e, quota = %quota, "限流计数存储不可用，放行请求");
                }
            }
        }
        last
    }
}

/// Wraps a router with the rate limit middleware.
pub fn attach(limiter: RateLimiter, router: Router) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        limiter,
        rate_limit_middleware,
    ))
}

/// Rate limit middleware handler.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&limiter, &req);
    let decision = limiter.check(&key).await;

    if decision.allowed {
        return next.run(req).await;
    }

    let retry_after = decision.retry_after.as_secs().max(1).to_string();
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after)],
        "rate limit exceeded",
    )
        .into_response()
}

/// Derives the counting key from a request per the policy's strategy.
fn client_key(limiter: &RateLimiter, req: &Request<Body>) -> String {
    match limiter.policy().key_strategy() {
        KeyStrategy::RemoteAddress => req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}
