//! In-process implementation of the Redis-side roles.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::repositories::AtomicCounter;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheError, CacheResult, CacheService, RateWindowStore};

#[derive(Default)]
struct CacheState {
    urls: HashMap<String, (String, u64)>,
    windows: HashMap<String, u64>,
    expiries: HashMap<String, u64>,
    counter: u64,
}

/// Resolution cache, allocation counter and rate windows in one map set.
///
/// TTLs are recorded but never enforced; tests advance the rate-limit clock
/// instead. [`MemoryCache::set_available`] simulates a Redis outage.
pub struct MemoryCache {
    state: Mutex<CacheState>,
    available: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Cached target for `code`, bypassing availability.
    pub fn cached_url(&self, code: &str) -> Option<String> {
        self.lock().urls.get(code).map(|(url, _)| url.clone())
    }

    pub fn url_ttl(&self, code: &str) -> Option<u64> {
        self.lock().urls.get(code).map(|(_, ttl)| *ttl)
    }

    /// Current value of a rate window key; `None` if it was never created.
    pub fn window_count(&self, key: &str) -> Option<u64> {
        self.lock().windows.get(key).copied()
    }

    pub fn window_expiry(&self, key: &str) -> Option<u64> {
        self.lock().expiries.get(key).copied()
    }

    pub fn window_keys(&self) -> Vec<String> {
        self.lock().windows.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> CacheResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Connection("memory cache marked unavailable".to_string()))
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        self.check_available()?;
        Ok(self.cached_url(short_code))
    }

    async fn set_url(
        &self,
        short_code: &str,
        target_url: &str,
        ttl_seconds: u64,
    ) -> CacheResult<()> {
        self.check_available()?;
        self.lock().urls.insert(
            short_code.to_string(),
            (target_url.to_string(), ttl_seconds),
        );
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateWindowStore for MemoryCache {
    async fn incr(&self, key: &str) -> CacheResult<u64> {
        self.check_available()?;
        let mut state = self.lock();
        let count = state.windows.entry(key.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()> {
        self.check_available()?;
        self.lock().expiries.insert(key.to_string(), seconds);
        Ok(())
    }
}

#[async_trait]
impl AtomicCounter for MemoryCache {
    async fn increment(&self) -> Result<u64, AppError> {
        self.check_available()?;
        let mut state = self.lock();
        state.counter += 1;
        Ok(state.counter)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
