//! Counter allocation with a primary and a fallback backing.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::repositories::{AtomicCounter, ShortUrlRepository};
use crate::error::AppError;

/// Adapts the store's increment-and-return to the [`AtomicCounter`] port.
pub struct StoreCounter {
    repository: Arc<dyn ShortUrlRepository>,
}

impl StoreCounter {
    pub fn new(repository: Arc<dyn ShortUrlRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl AtomicCounter for StoreCounter {
    async fn increment(&self) -> Result<u64, AppError> {
        self.repository.next_counter().await
    }

    fn backend(&self) -> &'static str {
        "store"
    }
}

/// Hands out a strictly increasing value per creation request.
///
/// The two backings are never reconciled. A value handed out by the
/// fallback may repeat one from the primary; the store's uniqueness check on
/// creation catches that.
pub struct CounterAllocator {
    primary: Arc<dyn AtomicCounter>,
    fallback: Arc<dyn AtomicCounter>,
}

impl CounterAllocator {
    pub fn new(primary: Arc<dyn AtomicCounter>, fallback: Arc<dyn AtomicCounter>) -> Self {
        Self { primary, fallback }
    }

    /// # Errors
    ///
    /// Returns [`AppError::TransientIo`] when both backings fail.
    pub async fn next(&self) -> Result<u64, AppError> {
        match self.primary.increment().await {
            Ok(value) => Ok(value),
            Err(primary_err) => {
                tracing::warn!(
                    primary = self.primary.backend(),
                    fallback = self.fallback.backend(),
                    error = %primary_err,
                    "Primary counter unavailable, falling back"
                );

                self.fallback.increment().await.map_err(|fallback_err| {
                    tracing::error!(error = %fallback_err, "Fallback counter failed");
                    AppError::transient(
                        "Counter allocation unavailable",
                        serde_json::json!({
                            "primary": primary_err.to_string(),
                            "fallback": fallback_err.to_string(),
                        }),
                    )
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockAtomicCounter, MockShortUrlRepository};
    use serde_json::json;

    fn counter_returning(result: Result<u64, AppError>, calls: usize) -> MockAtomicCounter {
        let mut mock = MockAtomicCounter::new();
        mock.expect_increment()
            .times(calls)
            .return_once(move || result);
        mock.expect_backend().return_const("mock");
        mock
    }

    #[tokio::test]
    async fn test_primary_value_is_used() {
        let primary = counter_returning(Ok(41), 1);
        let mut fallback = MockAtomicCounter::new();
        fallback.expect_increment().times(0);

        let allocator = CounterAllocator::new(Arc::new(primary), Arc::new(fallback));
        assert_eq!(allocator.next().await.unwrap(), 41);
    }

    #[tokio::test]
    async fn test_falls_back_on_primary_error() {
        let primary = counter_returning(Err(AppError::transient("down", json!({}))), 1);
        let fallback = counter_returning(Ok(7), 1);

        let allocator = CounterAllocator::new(Arc::new(primary), Arc::new(fallback));
        assert_eq!(allocator.next().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_both_failing_is_transient() {
        let primary = counter_returning(Err(AppError::transient("down", json!({}))), 1);
        let fallback = counter_returning(Err(AppError::fatal("broken", json!({}))), 1);

        let allocator = CounterAllocator::new(Arc::new(primary), Arc::new(fallback));
        let err = allocator.next().await.unwrap_err();
        assert!(matches!(err, AppError::TransientIo { .. }));
    }

    #[tokio::test]
    async fn test_store_counter_delegates_to_repository() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_next_counter().times(1).returning(|| Ok(3));

        let counter = StoreCounter::new(Arc::new(repo));
        assert_eq!(counter.increment().await.unwrap(), 3);
        assert_eq!(counter.backend(), "store");
    }
}
