//! Counter storage backends for the rate limiter.
//!
//! Counters use fixed windows: each (key, window) pair maps to a bucket
//! numbered by `now / window_secs`, and the bucket's counter is incremented
//! on every check. A request landing in a fresh bucket starts the count
//! over, so increments stay race-tolerant without cross-instance locking.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use super::{CounterDecision, Quota};

/// Error type shared by all store backends.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Storage interface for rate limit counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increments the counter for `key` in the current window of `quota`
    /// and reports whether the request is still within the limit.
    async fn check_and_increment(
        &self,
        key: &str,
        quota: &Quota,
    ) -> Result<CounterDecision, StoreError>;
}

/// Bucket index and seconds until the bucket rolls over.
fn window_bucket(now_secs: i64, window_secs: u64) -> (i64, u64) {
    let window = window_secs.max(1) as i64;
    let bucket = now_secs.div_euclid(window);
    let reset = (bucket + 1) * window - now_secs;
    (bucket, reset as u64)
}

fn decide(count: u64, quota: &Quota, reset_secs: u64) -> CounterDecision {
    let allowed = count <= u64::from(quota.limit);
    CounterDecision {
        allowed,
        remaining: u32::try_from(u64::from(quota.limit).saturating_sub(count)).unwrap_or(u32::MAX),
        retry_after: if allowed {
            Duration::ZERO
        } else {
            Duration::from_secs(reset_secs)
        },
    }
}

/// Redis-backed counter store shared by every instance of the host.
///
/// The connection is established lazily on the first check; constructing
/// the store performs no network I/O.
pub struct RedisCounterStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisCounterStore {
    /// Creates a store for a `redis://host:port` storage URI.
    pub fn new(storage_uri: &str) -> Result<Self, redis::RedisError> {
        Ok(Self {
            client: redis::Client::open(storage_uri)?,
            conn: OnceCell::new(),
        })
    }

    async fn manager(&self) -> Result<ConnectionManager, redis::RedisError> {
        self.conn
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await
            .cloned()
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn check_and_increment(
        &self,
        key: &str,
        quota: &Quota,
    ) -> Result<CounterDecision, StoreError> {
        let mut conn = self.manager().await?;
        let (bucket, reset_secs) = window_bucket(Utc::now().timestamp(), quota.window_secs());
        let redis_key = format!("rate-limit:{}:{}:{}", key, quota.window_secs(), bucket);

        let count: u64 = conn.incr(&redis_key, 1u64).await?;
        if count == 1 {
            // First hit in this bucket owns the expiry
            let _: bool = conn.expire(&redis_key, quota.window_secs() as i64).await?;
        }

        Ok(decide(count, quota, reset_secs))
    }
}

/// In-process counter store for single-node hosts and tests.
#[derive(Default)]
pub struct MemoryCounterStore {
    // (key, window_secs) -> (bucket, count)
    counters: Mutex<HashMap<(String, u64), (i64, u64)>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_at(&self, key: &str, quota: &Quota, now_secs: i64) -> CounterDecision {
        let (bucket, reset_secs) = window_bucket(now_secs, quota.window_secs());
        let mut counters = self.counters.lock().unwrap();
        let entry = counters
            .entry((key.to_string(), quota.window_secs()))
            .or_insert((bucket, 0));
        if entry.0 != bucket {
            // Stale bucket, window has rolled over
            *entry = (bucket, 0);
        }
        entry.1 += 1;
        decide(entry.1, quota, reset_secs)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn check_and_increment(
        &self,
        key: &str,
        quota: &Quota,
    ) -> Result<CounterDecision, StoreError> {
        Ok(self.check_at(key, quota, Utc::now().timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bucket_math() {
        let (bucket, reset) = window_bucket(7_200, 3_600);
        assert_eq!(bucket, 2);
        assert_eq!(reset, 3_600);

        let (bucket, reset) = window_bucket(7_201, 3_600);
        assert_eq!(bucket, 2);
        assert_eq!(reset, 3_599);
    }

    #[test]
    fn test_memory_store_denies_over_quota() {
        let store = MemoryCounterStore::new();
        let quota = Quota::per_hour(2);
        let now = 10_000;

        assert!(store.check_at("10.0.0.1", &quota, now).allowed);
        assert!(store.check_at("10.0.0.1", &quota, now).allowed);

        let denied = store.check_at("10.0.0.1", &quota, now);
        assert!(!denied.allowed);
        assert!(denied.retry_after > Duration::ZERO);
    }

    #[test]
    fn test_memory_store_keys_are_independent() {
        let store = MemoryCounterStore::new();
        let quota = Quota::per_hour(1);
        let now = 10_000;

        assert!(store.check_at("10.0.0.1", &quota, now).allowed);
        assert!(!store.check_at("10.0.0.1", &quota, now).allowed);
        assert!(store.check_at("10.0.0.2", &quota, now).allowed);
    }

    #[test]
    fn test_memory_store_resets_on_window_rollover() {
        let store = MemoryCounterStore::new();
        let quota = Quota::per_minute(1);

        assert!(store.check_at("10.0.0.1", &quota, 60).allowed);
        assert!(!store.check_at("10.0.0.1", &quota, 61).allowed);
        assert!(store.check_at("10.0.0.1", &quota, 120).allowed);
    }

    #[test]
    fn test_remaining_counts_down() {
        let store = MemoryCounterStore::new();
        let quota = Quota::per_hour(3);

        assert_eq!(store.check_at("k", &quota, 0).remaining, 2);
        assert_eq!(store.check_at("k", &quota, 0).remaining, 1);
        assert_eq!(store.check_at("k", &quota, 0).remaining, 0);
    }
}
