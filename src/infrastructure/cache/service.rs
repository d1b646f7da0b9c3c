//! Cache service traits and error types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),
    #[error("Cache operation error: {0}")]
    Operation(String),
    #[error("Cache operation timed out")]
    Timeout,
    #[error("Cache disabled")]
    Disabled,
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Read-through cache of code → target mappings.
///
/// Failures are returned to the caller, which treats them as misses. Entries
/// are never invalidated: short URL records are immutable.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
/// - [`crate::infrastructure::memory::MemoryCache`] - in-process, for tests
#[async_trait]
pub trait CacheService: Send + Sync {
    /// `Ok(None)` on a miss.
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores a mapping with a TTL in seconds.
    async fn set_url(&self, short_code: &str, target_url: &str, ttl_seconds: u64)
    -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}

/// Self-expiring hit counters for fixed rate-limit windows.
#[async_trait]
pub trait RateWindowStore: Send + Sync {
    /// Atomically increments `key` (created at zero) and returns the new count.
    async fn incr(&self, key: &str) -> CacheResult<u64>;

    /// Sets the key to expire after `seconds`.
    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()>;
}
