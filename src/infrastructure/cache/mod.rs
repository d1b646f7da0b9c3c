//! Redis-side state: resolution cache, primary counter and rate windows.
//!
//! - [`RedisCache`] - production implementation of all three roles
//! - [`NullCache`] - stand-in when Redis is not configured

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::{COUNTER_KEY, RedisCache};
pub use service::{CacheError, CacheResult, CacheService, RateWindowStore};
