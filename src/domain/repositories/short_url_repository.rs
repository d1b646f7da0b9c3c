//! Repository trait for short URL records and their owner index.

use crate::domain::entities::{NewShortUrl, ShortUrlRecord};
use crate::error::AppError;
use async_trait::async_trait;

/// Durable storage of short URLs.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortUrlRepository`] - PostgreSQL
/// - [`crate::infrastructure::memory::MemoryStore`] - in-process, for tests
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortUrlRepository: Send + Sync {
    /// Atomically writes the record and its owner index entry.
    ///
    /// The write is conditioned on neither key existing; it never overwrites.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateCode`] if either key already exists, in
    /// which case nothing was written.
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrlRecord, AppError>;

    /// Point lookup by code.
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortUrlRecord>, AppError>;

    /// Codes owned by `owner_id`, ordered by code.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<String>, AppError>;

    /// Atomically increments the store-side allocation counter and returns
    /// the new value.
    async fn next_counter(&self) -> Result<u64, AppError>;

    async fn health_check(&self) -> bool;
}
