//! HTTP server initialization and runtime setup.
//!
//! Builds every client handle, spawns the background workers and runs the
//! Axum server until a shutdown signal arrives.

use crate::application::services::MetricsAggregator;
use crate::config::Config;
use crate::domain::event_publisher::run_event_publisher;
use crate::domain::metrics_worker::run_metrics_worker;
use crate::domain::repositories::{AtomicCounter, MetricsRepository, ShortUrlRepository};
use crate::infrastructure::cache::{CacheService, NullCache, RateWindowStore, RedisCache};
use crate::infrastructure::memory::MemoryQueue;
use crate::infrastructure::persistence::{PgMetricsRepository, PgShortUrlRepository, connect_pool};
use crate::infrastructure::queue::{EventQueue, RedisStreamQueue, StreamSettings};
use crate::routes::app_router;
use crate::state::{AppState, Backends, StateOptions};
use crate::utils::code_encoder::CodeEncoder;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis cache, counter, rate windows and metrics stream (or in-process
///   fallbacks when Redis is absent)
/// - Event publisher and metrics worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The code encoder or router settings are invalid
/// - Server bind fails or the server stops with an error
pub async fn run(config: Config) -> Result<()> {
    let pool = Arc::new(connect_pool(&config).await?);
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(pool.as_ref())
        .await
        .context("Failed to run migrations")?;

    let encoder = Arc::new(
        CodeEncoder::new(&config.code_salt, config.code_min_length)
            .context("Invalid short code settings")?,
    );

    let short_urls: Arc<dyn ShortUrlRepository> = Arc::new(PgShortUrlRepository::new(pool.clone()));
    let metrics: Arc<dyn MetricsRepository> = Arc::new(PgMetricsRepository::new(
        pool.clone(),
        config.metrics_dedup_retention_hours,
    ));

    let backends = match connect_redis(&config).await {
        Some(redis) => {
            let queue = redis_queue(&config, &redis).await;
            let redis = Arc::new(redis);
            Backends {
                short_urls,
                metrics,
                cache: redis.clone(),
                counter: redis.clone(),
                rate_windows: redis,
                queue,
            }
        }
        None => {
            tracing::warn!(
                "Running without Redis: no resolution cache, counter served by the store, \
                 redirect rate limiting disabled, in-process metrics queue"
            );
            let null = Arc::new(NullCache::new());
            Backends {
                short_urls,
                metrics,
                cache: null.clone() as Arc<dyn CacheService>,
                counter: null.clone() as Arc<dyn AtomicCounter>,
                rate_windows: null as Arc<dyn RateWindowStore>,
                queue: Arc::new(MemoryQueue::new()),
            }
        }
    };

    let (state, event_rx) = AppState::build(
        &backends,
        StateOptions {
            encoder,
            cache_ttl_seconds: config.cache_ttl_seconds,
            rate_limit: config.rate_limit_policy(),
            event_buffer_capacity: config.event_buffer_capacity,
            behind_proxy: config.behind_proxy,
        },
    );

    tokio::spawn(run_event_publisher(event_rx, backends.queue.clone()));

    let aggregator = Arc::new(MetricsAggregator::new(backends.metrics.clone()));
    tokio::spawn(run_metrics_worker(
        backends.queue.clone(),
        aggregator,
        backends.metrics.clone(),
        config.worker_settings(),
    ));

    let app = app_router(state, config.api_rate_per_second, config.api_rate_burst)?;

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address: {}", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn connect_redis(config: &Config) -> Option<RedisCache> {
    let redis_url = config.redis_url.as_deref()?;

    match RedisCache::connect(redis_url, config.io_timeout()).await {
        Ok(redis) => {
            tracing::info!("Redis connected");
            Some(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}", e);
            None
        }
    }
}

/// Metrics stream on the shared Redis connection, or an in-process queue
/// if the consumer group cannot be set up.
async fn redis_queue(config: &Config, redis: &RedisCache) -> Arc<dyn EventQueue> {
    let settings = StreamSettings {
        stream: config.metrics_stream.clone(),
        group: config.metrics_group.clone(),
        consumer: config.metrics_consumer.clone(),
        max_len: config.metrics_stream_maxlen,
    };

    match RedisStreamQueue::new(redis.connection(), settings, config.io_timeout()).await {
        Ok(queue) => Arc::new(queue),
        Err(e) => {
            tracing::warn!("Metrics stream unavailable ({}), using in-process queue", e);
            Arc::new(MemoryQueue::new())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
