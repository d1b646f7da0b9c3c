//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access. Implementations live in
//! `crate::infrastructure::persistence` (PostgreSQL) and
//! `crate::infrastructure::memory` (in-process); mocks are generated with
//! `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`ShortUrlRepository`] - short URL records, owner index, fallback counter
//! - [`MetricsRepository`] - daily access rollups
//! - [`AtomicCounter`] - counter port composed by the allocator

pub mod counter;
pub mod metrics_repository;
pub mod short_url_repository;

pub use counter::AtomicCounter;
pub use metrics_repository::{MetricsRepository, UpsertOutcome};
pub use short_url_repository::ShortUrlRepository;

#[cfg(test)]
pub use counter::MockAtomicCounter;
#[cfg(test)]
pub use metrics_repository::MockMetricsRepository;
#[cfg(test)]
pub use short_url_repository::MockShortUrlRepository;
