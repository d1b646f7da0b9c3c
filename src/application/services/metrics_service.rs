//! Owner-scoped reads of daily rollups.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use crate::domain::entities::DailyMetric;
use crate::domain::repositories::{MetricsRepository, ShortUrlRepository};
use crate::error::AppError;

/// Longest range a single query may cover, in days.
pub const MAX_RANGE_DAYS: i64 = 366;

pub struct MetricsService {
    short_urls: Arc<dyn ShortUrlRepository>,
    metrics: Arc<dyn MetricsRepository>,
}

impl MetricsService {
    pub fn new(
        short_urls: Arc<dyn ShortUrlRepository>,
        metrics: Arc<dyn MetricsRepository>,
    ) -> Self {
        Self {
            short_urls,
            metrics,
        }
    }

    /// Rollups for `code` between `from` and `to` inclusive.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the range is inverted or too long
    /// - [`AppError::NotFound`] if the code does not exist
    /// - [`AppError::Forbidden`] if `owner_id` does not own it
    pub async fn get_metrics(
        &self,
        code: &str,
        owner_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyMetric>, AppError> {
        if from > to {
            return Err(AppError::validation(
                "start_date must not be after end_date",
                json!({ "fields": { "start_date": ["must not be after end_date"] } }),
            ));
        }
        if (to - from).num_days() >= MAX_RANGE_DAYS {
            return Err(AppError::validation(
                "Date range too long",
                json!({ "max_days": MAX_RANGE_DAYS }),
            ));
        }

        let record = self
            .short_urls
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "code": code })))?;

        if record.owner_id != owner_id {
            tracing::warn!(code, owner = owner_id, "Metrics requested by non-owner");
            return Err(AppError::forbidden(
                "Short URL belongs to another owner",
                json!({ "code": code }),
            ));
        }

        self.metrics.daily_range(code, from, to).await
    }
}
