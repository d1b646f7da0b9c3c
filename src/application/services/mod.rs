//! Business logic services for the application layer.

pub mod counter_allocator;
pub mod link_service;
pub mod metrics_aggregator;
pub mod metrics_emitter;
pub mod metrics_service;
pub mod rate_limiter;

pub use counter_allocator::{CounterAllocator, StoreCounter};
pub use link_service::LinkService;
pub use metrics_aggregator::{BatchReport, MetricsAggregator};
pub use metrics_emitter::MetricsEmitter;
pub use metrics_service::MetricsService;
pub use rate_limiter::{RateDecision, RateLimitPolicy, RateLimiter};
