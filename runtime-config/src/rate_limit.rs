//! Rate limiting building blocks.
//!
//! The pieces are deliberately separable:
//! - [`RateLimitPolicy`] is pure configuration: quotas, key strategy, and a
//!   storage URI. It never touches the network.
//! - [`store::CounterStore`] owns the counters, with a Redis-backed
//!   implementation for multi-instance hosts and an in-memory one for
//!   single-node hosts and tests.
//! - [`middleware`] enforces the policy inside the hosting application's
//!   request pipeline.

use std::fmt;
use std::time::Duration;

pub mod middleware;
pub mod store;

pub use middleware::RateLimiter;
pub use store::{CounterStore, MemoryCounterStore, RedisCounterStore};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;

/// A request quota over a fixed time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Window duration.
    pub window: Duration,
}

impl Quota {
    /// Quota over an arbitrary window.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    /// Quota per calendar day.
    pub fn per_day(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(SECS_PER_DAY))
    }

    /// Quota per hour.
    pub fn per_hour(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(SECS_PER_HOUR))
    }

    /// Quota per minute.
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(SECS_PER_MINUTE))
    }

    /// Window length in whole seconds.
    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window.as_secs() {
            SECS_PER_DAY => write!(f, "{} per day", self.limit),
            SECS_PER_HOUR => write!(f, "{} per hour", self.limit),
            SECS_PER_MINUTE => write!(f, "{} per minute", self.limit),
            secs => write!(f, "{} per {}s", self.limit, secs),
        }
    }
}

/// How the limiter derives the counting key from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStrategy {
    /// Count per client network address.
    #[default]
    RemoteAddress,
}

/// Declarative rate limit policy consumed by the hosting application.
///
/// Immutable after construction; quotas are enforced in declaration order
/// and the first exhausted quota denies the request.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    quotas: Vec<Quota>,
    key_strategy: KeyStrategy,
    storage_uri: String,
}

impl RateLimitPolicy {
    /// Empty policy bound to a counter storage URI.
    pub fn new(storage_uri: impl Into<String>) -> Self {
        Self {
            quotas: Vec::new(),
            key_strategy: KeyStrategy::RemoteAddress,
            storage_uri: storage_uri.into(),
        }
    }

    /// The default Superset limits: 200 per day, then 50 per hour.
    pub fn default_limits(storage_uri: impl Into<String>) -> Self {
        Self::new(storage_uri)
            .with_quota(Quota::per_day(200))
            .with_quota(Quota::per_hour(50))
    }

    /// Appends a quota; quotas are checked in the order they were added.
    pub fn with_quota(mut self, quota: Quota) -> Self {
        self.quotas.push(quota);
        self
    }

    /// The declared quotas, in enforcement order.
    pub fn quotas(&self) -> &[Quota] {
        &self.quotas
    }

    /// The configured key-extraction strategy.
    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    /// The counter storage URI.
    pub fn storage_uri(&self) -> &str {
        &self.storage_uri
    }
}

/// Outcome of a single counter check.
#[derive(Debug, Clone)]
pub struct CounterDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Permits left in the window after this request.
    pub remaining: u32,
    /// How long to wait before the window resets; zero when allowed.
    pub retry_after: Duration,
}

impl CounterDecision {
    /// Decision used when no quota constrains the request.
    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            remaining: u32::MAX,
            retry_after: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_match_superset_policy() {
        let policy = RateLimitPolicy::default_limits("redis://superset_cache:6379");
        assert_eq!(policy.quotas(), &[Quota::per_day(200), Quota::per_hour(50)]);
        assert_eq!(policy.key_strategy(), KeyStrategy::RemoteAddress);
        assert_eq!(policy.storage_uri(), "redis://superset_cache:6379");
    }

    #[test]
    fn test_quota_display() {
        assert_eq!(Quota::per_day(200).to_string(), "200 per day");
        assert_eq!(Quota::per_hour(50).to_string(), "50 per hour");
        assert_eq!(
            Quota::new(5, Duration::from_secs(90)).to_string(),
            "5 per 90s"
        );
    }

    #[test]
    fn test_quotas_keep_declaration_order() {
        let policy = RateLimitPolicy::new("redis://cache:6379")
            .with_quota(Quota::per_hour(10))
            .with_quota(Quota::per_minute(3));
        assert_eq!(policy.quotas()[0], Quota::per_hour(10));
        assert_eq!(policy.quotas()[1], Quota::per_minute(3));
    }
}
