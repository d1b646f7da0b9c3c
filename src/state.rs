//! Shared handler state and its wiring.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{
    CounterAllocator, LinkService, MetricsEmitter, MetricsService, RateLimitPolicy, RateLimiter,
    StoreCounter,
};
use crate::domain::entities::AccessEvent;
use crate::domain::repositories::{AtomicCounter, MetricsRepository, ShortUrlRepository};
use crate::infrastructure::cache::{CacheService, RateWindowStore};
use crate::infrastructure::queue::EventQueue;
use crate::utils::code_encoder::CodeEncoder;

/// Cloned into every handler; all members are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub metrics_emitter: MetricsEmitter,
    pub metrics_service: Arc<MetricsService>,
    /// Used by the health check.
    pub short_urls: Arc<dyn ShortUrlRepository>,
    pub cache: Arc<dyn CacheService>,
    pub queue: Arc<dyn EventQueue>,
    /// Read client IPs from forwarding headers.
    pub behind_proxy: bool,
}

/// Storage handles the services are built on.
#[derive(Clone)]
pub struct Backends {
    pub short_urls: Arc<dyn ShortUrlRepository>,
    pub metrics: Arc<dyn MetricsRepository>,
    pub cache: Arc<dyn CacheService>,
    /// Primary allocation counter; the store counter is the fallback.
    pub counter: Arc<dyn AtomicCounter>,
    pub rate_windows: Arc<dyn RateWindowStore>,
    pub queue: Arc<dyn EventQueue>,
}

#[derive(Clone)]
pub struct StateOptions {
    pub encoder: Arc<CodeEncoder>,
    pub cache_ttl_seconds: u64,
    pub rate_limit: RateLimitPolicy,
    pub event_buffer_capacity: usize,
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires the services over `backends`.
    ///
    /// Returns the receiving end of the event buffer, to be drained by
    /// [`crate::domain::event_publisher::run_event_publisher`].
    pub fn build(
        backends: &Backends,
        options: StateOptions,
    ) -> (Self, mpsc::Receiver<AccessEvent>) {
        let allocator = CounterAllocator::new(
            backends.counter.clone(),
            Arc::new(StoreCounter::new(backends.short_urls.clone())),
        );

        let link_service = Arc::new(LinkService::new(
            backends.short_urls.clone(),
            backends.cache.clone(),
            allocator,
            options.encoder.clone(),
            options.cache_ttl_seconds,
        ));

        let rate_limiter = Arc::new(RateLimiter::new(
            backends.rate_windows.clone(),
            options.encoder,
            options.rate_limit,
        ));

        let metrics_service = Arc::new(MetricsService::new(
            backends.short_urls.clone(),
            backends.metrics.clone(),
        ));

        let (metrics_emitter, rx) = MetricsEmitter::channel(options.event_buffer_capacity);

        let state = Self {
            link_service,
            rate_limiter,
            metrics_emitter,
            metrics_service,
            short_urls: backends.short_urls.clone(),
            cache: backends.cache.clone(),
            queue: backends.queue.clone(),
            behind_proxy: options.behind_proxy,
        };

        (state, rx)
    }
}
