//! Redis-backed cache, counter and rate-window implementation.

use super::service::{CacheError, CacheResult, CacheService, RateWindowStore};
use crate::domain::repositories::AtomicCounter;
use crate::error::AppError;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Redis key of the primary allocation counter.
pub const COUNTER_KEY: &str = "shorturl:counter";

/// One Redis connection serving three roles: the resolution cache
/// (`shorturl:<code>`), the primary allocation counter
/// ([`COUNTER_KEY`]) and rate-limit windows (`rl:<code>:<window_start>`).
///
/// Uses `ConnectionManager` for reconnects and connection reuse. Every call
/// is bounded by the configured I/O timeout.
#[derive(Clone)]
pub struct RedisCache {
    client: ConnectionManager,
    key_prefix: String,
    timeout: Duration,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, timeout: Duration) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {e}")))?;

        let manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {e}")))?;

        let cache = Self::from_manager(manager, timeout);
        cache
            .bounded(async {
                let mut conn = cache.client.clone();
                conn.ping::<()>().await
            })
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {e}")))?;

        info!("✓ Connected to Redis");
        Ok(cache)
    }

    pub fn from_manager(manager: ConnectionManager, timeout: Duration) -> Self {
        Self {
            client: manager,
            key_prefix: "shorturl:".to_string(),
            timeout,
        }
    }

    /// Shared connection, for components that issue their own commands.
    pub fn connection(&self) -> ConnectionManager {
        self.client.clone()
    }

    fn build_key(&self, short_code: &str) -> String {
        format!("{}{}", self.key_prefix, short_code)
    }

    async fn bounded<T, F>(&self, fut: F) -> CacheResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Operation(e.to_string())),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        let cached = self
            .bounded(async move { conn.get::<_, Option<String>>(&key).await })
            .await?;
        debug!(code = short_code, hit = cached.is_some(), "Cache lookup");
        Ok(cached)
    }

    async fn set_url(
        &self,
        short_code: &str,
        target_url: &str,
        ttl_seconds: u64,
    ) -> CacheResult<()> {
        let key = self.build_key(short_code);
        let mut conn = self.client.clone();

        self.bounded(async move { conn.set_ex::<_, _, ()>(&key, target_url, ttl_seconds).await })
            .await?;
        debug!(code = short_code, ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        self.bounded(async move { conn.ping::<()>().await })
            .await
            .is_ok()
    }
}

#[async_trait]
impl RateWindowStore for RedisCache {
    async fn incr(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.client.clone();
        self.bounded(async move { conn.incr::<_, _, u64>(key, 1u64).await })
            .await
    }

    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        self.bounded(async move { conn.expire::<_, ()>(key, seconds).await })
            .await
    }
}

#[async_trait]
impl AtomicCounter for RedisCache {
    async fn increment(&self) -> Result<u64, AppError> {
        let mut conn = self.client.clone();
        let value = self
            .bounded(async move { conn.incr::<_, _, u64>(COUNTER_KEY, 1u64).await })
            .await?;
        Ok(value)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
