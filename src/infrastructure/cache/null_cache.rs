//! No-op cache used when Redis is not configured.

use super::service::{CacheError, CacheResult, CacheService, RateWindowStore};
use crate::domain::repositories::AtomicCounter;
use crate::error::AppError;
use async_trait::async_trait;
use tracing::debug;

/// Stands in for Redis when it is disabled.
///
/// - as [`CacheService`]: always misses, writes are dropped
/// - as [`AtomicCounter`]: always unavailable, so the allocator uses the store
/// - as [`RateWindowStore`]: always unavailable, so the limiter fails open
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("Using NullCache (Redis disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_url(&self, _short_code: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_url(&self, _short_code: &str, _target_url: &str, _ttl: u64) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
impl RateWindowStore for NullCache {
    async fn incr(&self, _key: &str) -> CacheResult<u64> {
        Err(CacheError::Disabled)
    }

    async fn expire(&self, _key: &str, _seconds: u64) -> CacheResult<()> {
        Err(CacheError::Disabled)
    }
}

#[async_trait]
impl AtomicCounter for NullCache {
    async fn increment(&self) -> Result<u64, AppError> {
        Err(CacheError::Disabled.into())
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_cache_always_misses() {
        let cache = NullCache::new();
        cache.set_url("stdabc", "example.com", 60).await.unwrap();
        assert_eq!(cache.get_url("stdabc").await.unwrap(), None);
        assert!(cache.health_check().await);
    }

    #[tokio::test]
    async fn test_null_cache_counters_are_unavailable() {
        let cache = NullCache::new();
        assert!(cache.incr("rl:stdabc:0").await.is_err());
        assert!(cache.increment().await.unwrap_err().is_transient());
    }
}
