//! Background task draining the event buffer into the durable queue.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::entities::AccessEvent;
use crate::infrastructure::queue::EventQueue;

/// Publishes buffered events until every sender is dropped.
///
/// Failures are logged and the event is dropped; the redirect that produced
/// it has already been answered.
pub async fn run_event_publisher(mut rx: mpsc::Receiver<AccessEvent>, queue: Arc<dyn EventQueue>) {
    tracing::info!("Event publisher started");

    while let Some(event) = rx.recv().await {
        publish_one(queue.as_ref(), &event).await;
    }

    tracing::info!("Event publisher stopped");
}

/// Returns whether the event reached the queue.
pub async fn publish_one(queue: &dyn EventQueue, event: &AccessEvent) -> bool {
    let body = match serde_json::to_string(event) {
        Ok(body) => body,
        Err(e) => {
            metrics::counter!("access_events_dropped_total", "reason" => "serialize").increment(1);
            tracing::error!(code = %event.code, error = %e, "Failed to serialize access event");
            return false;
        }
    };

    match queue.publish(&body).await {
        Ok(message_id) => {
            tracing::trace!(code = %event.code, message_id = %message_id, "Access event published");
            true
        }
        Err(e) => {
            metrics::counter!("access_events_dropped_total", "reason" => "queue").increment(1);
            tracing::warn!(code = %event.code, error = %e, "Failed to publish access event");
            false
        }
    }
}
