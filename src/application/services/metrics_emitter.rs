//! Fire-and-forget hand-off of access events from the redirect path.

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::domain::entities::AccessEvent;

/// Sending half of the bounded event buffer.
///
/// [`MetricsEmitter::emit`] never waits and never fails the caller; the
/// background publisher drains the other end into the durable queue.
#[derive(Clone)]
pub struct MetricsEmitter {
    tx: mpsc::Sender<AccessEvent>,
}

impl MetricsEmitter {
    pub fn new(tx: mpsc::Sender<AccessEvent>) -> Self {
        Self { tx }
    }

    /// Creates an emitter and the receiver the publisher consumes.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AccessEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Queues `event`, assigning an `event_id` if it has none.
    ///
    /// Returns whether the event was buffered. A full or closed buffer drops
    /// the event with a warning.
    pub fn emit(&self, mut event: AccessEvent) -> bool {
        event.event_id.get_or_insert_with(Uuid::new_v4);

        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                metrics::counter!("access_events_dropped_total", "reason" => "buffer_full")
                    .increment(1);
                tracing::warn!(code = %event.code, "Event buffer full, dropping access event");
                false
            }
            Err(TrySendError::Closed(event)) => {
                metrics::counter!("access_events_dropped_total", "reason" => "closed")
                    .increment(1);
                tracing::warn!(code = %event.code, "Event publisher stopped, dropping access event");
                false
            }
        }
    }

    /// Free slots left in the buffer.
    pub fn remaining_capacity(&self) -> usize {
        self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DeviceClass;

    fn event(code: &str) -> AccessEvent {
        AccessEvent {
            code: code.to_string(),
            client_ip: "203.0.113.7".to_string(),
            timestamp: 1_672_531_200,
            referrer: None,
            user_agent: "curl/8".to_string(),
            country: "US".to_string(),
            device_class: DeviceClass::Desktop,
            event_id: None,
        }
    }

    #[tokio::test]
    async fn test_emit_assigns_event_id() {
        let (emitter, mut rx) = MetricsEmitter::channel(4);
        assert!(emitter.emit(event("stdAbc")));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.code, "stdAbc");
        assert!(received.event_id.is_some());
    }

    #[tokio::test]
    async fn test_emit_keeps_existing_event_id() {
        let (emitter, mut rx) = MetricsEmitter::channel(4);
        let id = Uuid::new_v4();
        emitter.emit(AccessEvent {
            event_id: Some(id),
            ..event("stdAbc")
        });

        assert_eq!(rx.recv().await.unwrap().event_id, Some(id));
    }

    #[tokio::test]
    async fn test_full_buffer_drops_without_blocking() {
        let (emitter, _rx) = MetricsEmitter::channel(1);
        assert!(emitter.emit(event("a")));
        assert!(!emitter.emit(event("b")));
        assert_eq!(emitter.remaining_capacity(), 0);
    }

    #[tokio::test]
    async fn test_closed_buffer_drops() {
        let (emitter, rx) = MetricsEmitter::channel(1);
        drop(rx);
        assert!(emitter.is_closed());
        assert!(!emitter.emit(event("a")));
    }
}
