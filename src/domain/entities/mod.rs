//! Core domain entities.
//!
//! - [`ShortUrlRecord`] / [`NewShortUrl`] - durable code → target mapping
//! - [`AccessEvent`] - one redirect attempt as carried on the metrics queue
//! - [`DailyMetric`] / [`MetricCounts`] - per-(code, day) access rollups
//! - [`DailyGroup`] - deduplicated events of one batch sharing a rollup key

pub mod access_event;
pub mod daily_metric;
pub mod short_url;

pub use access_event::{AccessEvent, DeviceClass, NO_REFERRER};
pub use daily_metric::{DailyGroup, DailyMetric, MetricCounts};
pub use short_url::{NewShortUrl, ShortUrlRecord};
