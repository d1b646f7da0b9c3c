//! Application layer services implementing business logic.
//!
//! Services consume the domain ports (repository, counter, cache, queue
//! traits) and give the HTTP handlers and background workers a small API.
//!
//! # Available Services
//!
//! - [`services::LinkService`] - short URL creation and cached resolution
//! - [`services::CounterAllocator`] - primary/fallback counter allocation
//! - [`services::RateLimiter`] - per-code fixed-window quotas
//! - [`services::MetricsEmitter`] - non-blocking access event hand-off
//! - [`services::MetricsAggregator`] - batch rollup of access events
//! - [`services::MetricsService`] - owner-scoped rollup queries

pub mod services;
