//! Durable event queue trait and error types.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue connection error: {0}")]
    Connection(String),
    #[error("Queue operation error: {0}")]
    Operation(String),
    #[error("Queue operation timed out")]
    Timeout,
}

pub type QueueResult<T> = Result<T, QueueError>;

/// A delivered message: the queue-assigned id plus the raw body.
///
/// The id is delivery-scoped and only used for acknowledgement; it is never
/// persisted alongside the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
}

impl QueueMessage {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            body: body.into(),
        }
    }
}

/// At-least-once queue between the metrics emitter and the aggregator.
///
/// Messages handed out by [`EventQueue::receive`] stay pending until
/// acknowledged. Pending messages are handed out again before new ones.
///
/// # Implementations
///
/// - [`crate::infrastructure::queue::RedisStreamQueue`] - Redis Stream + consumer group
/// - [`crate::infrastructure::memory::MemoryQueue`] - in-process, not durable
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Appends a message and returns its id.
    async fn publish(&self, body: &str) -> QueueResult<String>;

    /// Up to `max` messages: unacknowledged ones first, then new ones.
    /// Returns empty immediately when nothing is available.
    async fn receive(&self, max: usize) -> QueueResult<Vec<QueueMessage>>;

    /// Acknowledges processed messages so they are not delivered again.
    async fn ack(&self, message_ids: &[String]) -> QueueResult<()>;

    async fn health_check(&self) -> bool;
}
