//! Repository trait for daily access rollups.

use crate::domain::entities::{DailyGroup, DailyMetric};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Result of applying one [`DailyGroup`] to durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The rollup row did not exist and was created.
    Inserted,
    /// The rollup row existed and was incremented.
    Merged,
    /// Every event of the group had been applied before.
    AlreadyApplied,
    /// Nothing was written; the group must be redelivered.
    Failed(String),
}

impl UpsertOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, UpsertOutcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted => "inserted",
            UpsertOutcome::Merged => "merged",
            UpsertOutcome::AlreadyApplied => "already_applied",
            UpsertOutcome::Failed(_) => "failed",
        }
    }
}

/// Storage of per-(code, day) rollups.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgMetricsRepository`] - PostgreSQL
/// - [`crate::infrastructure::memory::MemoryStore`] - in-process, for tests
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Applies a group in one atomic step.
    ///
    /// Event keys already applied are skipped. The remaining events are
    /// inserted as a new rollup when none exists for (code, day), otherwise
    /// added onto the existing counters. Either all of it is committed or
    /// none of it is.
    async fn upsert_daily(&self, group: &DailyGroup) -> UpsertOutcome;

    /// Rollups for `code` with `from <= day <= to`, ordered by day.
    async fn daily_range(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyMetric>, AppError>;

    /// Deletes applied-event markers past their retention. Returns the
    /// number removed.
    async fn purge_expired_markers(&self) -> Result<u64, AppError>;
}
