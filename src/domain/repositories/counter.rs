//! Atomic counter port used by the allocator.

use crate::error::AppError;
use async_trait::async_trait;

/// A single named integer that can be atomically incremented.
///
/// Every returned value is strictly greater than any value previously
/// returned by the same backing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AtomicCounter: Send + Sync {
    async fn increment(&self) -> Result<u64, AppError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
