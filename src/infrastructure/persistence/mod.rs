//! PostgreSQL repository implementations.
//!
//! Every item lives in one keyed-entity table, `entities(pk, sk, attrs)`;
//! see [`keys`] for the layout.
//!
//! # Repositories
//!
//! - [`PgShortUrlRepository`] - short URL records, owner index, fallback counter
//! - [`PgMetricsRepository`] - daily rollups and applied-event markers

pub mod keys;
pub mod pg_metrics_repository;
pub mod pg_short_url_repository;

pub use pg_metrics_repository::PgMetricsRepository;
pub use pg_short_url_repository::PgShortUrlRepository;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;

/// Opens the connection pool. Every statement runs under
/// `statement_timeout = IO_TIMEOUT_MS`.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let options = PgConnectOptions::from_str(&config.database_url)
        .context("Invalid DATABASE_URL")?
        .options([("statement_timeout", config.io_timeout_ms.to_string())]);

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect_with(options)
        .await
        .context("Failed to connect to database")
}
