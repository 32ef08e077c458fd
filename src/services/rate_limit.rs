// Rate limiting for the webhook and job-trigger endpoints
// Counting lives behind an injectable store: Redis in production so limits
// coordinate across instances, and an in-memory store with an explicit
// sweep for tests and single-instance development.

use async_trait::async_trait;
use deadpool_redis::redis;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::db::RedisPool;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    Pool(String),
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Fixed-window rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the time window
    pub max_requests: u32,

    /// Time window in seconds
    pub window_seconds: u32,
}

impl RateLimitConfig {
    /// Webhook ingress: high enough for provider retry bursts
    pub fn webhook_endpoint() -> Self {
        let security = &crate::app_config::config().security;
        Self {
            max_requests: security.webhook_rate_limit_max_requests,
            window_seconds: security.webhook_rate_limit_window_seconds,
        }
    }

    /// Daily job trigger: a handful of invocations per hour is plenty
    pub fn job_endpoint() -> Self {
        let security = &crate::app_config::config().security;
        Self {
            max_requests: security.job_rate_limit_max_requests,
            window_seconds: security.job_rate_limit_window_seconds,
        }
    }
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after: Option<u32>,
}

// =============================================================================
// STORE ABSTRACTION
// =============================================================================

/// Counter storage for rate limiting
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Increment the counter for `key` within the current window and
    /// return the post-increment count
    async fn increment(&self, key: &str, window_seconds: u32) -> Result<u64, RateLimitError>;
}

/// Redis-backed store; counters are shared across instances
pub struct RedisRateLimitStore {
    pool: RedisPool,
}

impl RedisRateLimitStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment(&self, key: &str, window_seconds: u32) -> Result<u64, RateLimitError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| RateLimitError::Pool(e.to_string()))?;

        let window_key = format!("rate_limit:{}", key);

        // INCR then EXPIRE NX: the first request in a window sets the TTL,
        // later requests leave it alone
        let count: u64 = redis::cmd("INCR")
            .arg(&window_key)
            .query_async(&mut conn)
            .await?;
        let _: bool = redis::cmd("EXPIRE")
            .arg(&window_key)
            .arg(window_seconds)
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        Ok(count)
    }
}

/// Process-local store with an explicit sweep; init at startup, sweep
/// periodically, drop on shutdown. Not suitable for multi-instance
/// deployments.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, WindowEntry>>,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u64,
    expires_at: u64,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove expired windows; call periodically
    pub fn sweep(&self) {
        let now = unix_now();
        if let Ok(mut windows) = self.windows.lock() {
            windows.retain(|_, entry| entry.expires_at > now);
        }
    }

    pub fn len(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn increment(&self, key: &str, window_seconds: u32) -> Result<u64, RateLimitError> {
        let now = unix_now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry = windows.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            expires_at: now + window_seconds as u64,
        });
        if entry.expires_at <= now {
            entry.count = 0;
            entry.expires_at = now + window_seconds as u64;
        }
        entry.count += 1;

        Ok(entry.count)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// SERVICE
// =============================================================================

/// Rate limiting service over an injected store
pub struct RateLimitService {
    store: Box<dyn RateLimitStore>,
    enabled: bool,
}

impl RateLimitService {
    pub fn new(store: Box<dyn RateLimitStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Check and consume one request for `key`
    ///
    /// A store failure fails open with a warning; dropping webhook events
    /// over a counter outage is worse than briefly unthrottled traffic.
    #[instrument(skip(self, config))]
    pub async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        if !self.enabled {
            return RateLimitResult {
                allowed: true,
                remaining: config.max_requests,
                retry_after: None,
            };
        }

        match self.store.increment(key, config.window_seconds).await {
            Ok(count) => {
                let allowed = count <= config.max_requests as u64;
                RateLimitResult {
                    allowed,
                    remaining: (config.max_requests as u64).saturating_sub(count) as u32,
                    retry_after: if allowed {
                        None
                    } else {
                        Some(config.window_seconds)
                    },
                }
            }
            Err(e) => {
                warn!("Rate limit store unavailable, allowing request: {}", e);
                RateLimitResult {
                    allowed: true,
                    remaining: 0,
                    retry_after: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            max_requests: 3,
            window_seconds: 60,
        }
    }

    #[tokio::test]
    async fn test_in_memory_store_counts_within_window() {
        let store = InMemoryRateLimitStore::new();
        assert_eq!(store.increment("k", 60).await.unwrap(), 1);
        assert_eq!(store.increment("k", 60).await.unwrap(), 2);
        assert_eq!(store.increment("other", 60).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_service_blocks_past_limit() {
        let service = RateLimitService::new(Box::new(InMemoryRateLimitStore::new()), true);
        let config = test_config();

        for _ in 0..3 {
            assert!(service.check("ip:1.2.3.4", &config).await.allowed);
        }
        let result = service.check("ip:1.2.3.4", &config).await;
        assert!(!result.allowed);
        assert_eq!(result.retry_after, Some(60));
    }

    #[tokio::test]
    async fn test_disabled_service_always_allows() {
        let service = RateLimitService::new(Box::new(InMemoryRateLimitStore::new()), false);
        let config = test_config();

        for _ in 0..10 {
            assert!(service.check("ip:1.2.3.4", &config).await.allowed);
        }
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_windows() {
        let store = InMemoryRateLimitStore::new();
        store.increment("k", 0).await.unwrap();
        assert_eq!(store.len(), 1);

        store.sweep();
        assert!(store.is_empty());
    }
}
