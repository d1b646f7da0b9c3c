//! Domain layer containing business entities and background processing.
//!
//! - [`tier`] - subscription tiers and their short-code tags
//! - [`entities`] - short URL records, access events, daily rollups
//! - [`repositories`] - storage and counter ports
//! - [`event_publisher`] - drains the in-process event buffer into the queue
//! - [`metrics_worker`] - consumes the queue and applies rollups
//!
//! # Access Event Flow
//!
//! 1. The redirect handler builds an [`entities::AccessEvent`] and hands it
//!    to [`crate::application::services::MetricsEmitter`]
//! 2. [`event_publisher::run_event_publisher`] writes it to the durable queue
//! 3. [`metrics_worker::run_metrics_worker`] reads batches and applies them
//!    through [`crate::application::services::MetricsAggregator`]

pub mod entities;
pub mod event_publisher;
pub mod metrics_worker;
pub mod repositories;
pub mod tier;
