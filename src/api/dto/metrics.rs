//! Query parameters for rollup reads.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

/// `?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`; both default to today (UTC).
#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl MetricsQuery {
    /// `(start, end)` with defaults applied.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        let today = Utc::now().date_naive();
        (
            self.start_date.unwrap_or(today),
            self.end_date.unwrap_or(today),
        )
    }
}
