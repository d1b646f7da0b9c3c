//! Metrics consumer loop.
//!
//! Reads batches from the event queue, hands them to the aggregator and
//! acknowledges everything the aggregator did not report as failed. A read
//! returns pending (unacknowledged) messages before new ones, which is what
//! turns a failed group into a redelivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::application::services::{BatchReport, MetricsAggregator};
use crate::domain::repositories::MetricsRepository;
use crate::infrastructure::queue::{EventQueue, QueueResult};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub batch_size: usize,
    /// Wait after an empty read.
    pub idle_wait: Duration,
    /// Wait after a queue error or a batch with failed groups.
    pub retry_backoff: Duration,
    pub purge_interval: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            idle_wait: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(5),
            purge_interval: Duration::from_secs(3600),
        }
    }
}

/// What one [`process_once`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub received: usize,
    pub acked: usize,
    pub report: BatchReport,
}

impl PassSummary {
    fn empty() -> Self {
        Self {
            received: 0,
            acked: 0,
            report: BatchReport::default(),
        }
    }
}

/// Reads one batch, aggregates it and acknowledges the processed messages.
///
/// A panic during aggregation is caught and the whole batch is treated as
/// failed. Markers written by groups that did commit make the redelivery a
/// no-op for them.
///
/// # Errors
///
/// Returns the queue error if reading or acknowledging fails.
pub async fn process_once(
    queue: &dyn EventQueue,
    aggregator: &Arc<MetricsAggregator>,
    batch_size: usize,
) -> QueueResult<PassSummary> {
    let messages = queue.receive(batch_size).await?;
    if messages.is_empty() {
        return Ok(PassSummary::empty());
    }

    let received = messages.len();
    let all_ids: Vec<String> = messages.iter().map(|m| m.message_id.clone()).collect();

    let task_aggregator = Arc::clone(aggregator);
    let task = tokio::spawn(async move { task_aggregator.process_batch(messages).await });
    let report = match task.await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(
                error = %e,
                messages = received,
                "Batch processing aborted, batch left pending"
            );
            BatchReport {
                failed_message_ids: all_ids.clone(),
                ..BatchReport::default()
            }
        }
    };

    let to_ack: Vec<String> = all_ids
        .into_iter()
        .filter(|id| !report.failed_message_ids.contains(id))
        .collect();

    if !to_ack.is_empty() {
        queue.ack(&to_ack).await?;
    }

    tracing::debug!(
        received,
        acked = to_ack.len(),
        inserted = report.inserted,
        merged = report.merged,
        already_applied = report.already_applied,
        failed_groups = report.failed_groups,
        malformed = report.malformed,
        "Metrics batch processed"
    );

    Ok(PassSummary {
        received,
        acked: to_ack.len(),
        report,
    })
}

/// Runs the consumer loop forever.
pub async fn run_metrics_worker(
    queue: Arc<dyn EventQueue>,
    aggregator: Arc<MetricsAggregator>,
    repository: Arc<dyn MetricsRepository>,
    settings: WorkerSettings,
) {
    tracing::info!(
        batch_size = settings.batch_size,
        idle_wait_ms = settings.idle_wait.as_millis() as u64,
        "Metrics worker started"
    );

    let mut next_purge = Instant::now() + settings.purge_interval;

    loop {
        let wait = match process_once(queue.as_ref(), &aggregator, settings.batch_size).await {
            Ok(summary) if summary.received == 0 => Some(settings.idle_wait),
            Ok(summary) if !summary.report.is_success() => Some(settings.retry_backoff),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Metrics queue unavailable");
                Some(settings.retry_backoff)
            }
        };

        if Instant::now() >= next_purge {
            match repository.purge_expired_markers().await {
                Ok(removed) => tracing::info!(removed, "Purged expired event markers"),
                Err(e) => tracing::warn!(error = %e, "Event marker purge failed"),
            }
            next_purge = Instant::now() + settings.purge_interval;
        }

        if let Some(wait) = wait {
            sleep(wait).await;
        }
    }
}
