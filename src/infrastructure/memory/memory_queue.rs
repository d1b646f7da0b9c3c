//! In-process event queue with pending-list redelivery.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::infrastructure::queue::{EventQueue, QueueError, QueueMessage, QueueResult};

#[derive(Default)]
struct QueueState {
    next_id: u64,
    ready: VecDeque<QueueMessage>,
    /// Delivered but not acknowledged, in delivery order.
    pending: Vec<QueueMessage>,
}

/// Mirrors the consumer-group behaviour of the Redis Stream queue for a
/// single consumer: unacknowledged messages are handed out again before
/// new ones. Nothing survives a restart.
pub struct MemoryQueue {
    state: Mutex<QueueState>,
    available: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Messages not yet delivered.
    pub fn ready_len(&self) -> usize {
        self.lock().ready.len()
    }

    /// Messages delivered but not acknowledged.
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> QueueResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(QueueError::Connection("memory queue marked unavailable".to_string()))
        }
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventQueue for MemoryQueue {
    async fn publish(&self, body: &str) -> QueueResult<String> {
        self.check_available()?;
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("{}-0", state.next_id);
        state.ready.push_back(QueueMessage::new(id.clone(), body));
        Ok(id)
    }

    async fn receive(&self, max: usize) -> QueueResult<Vec<QueueMessage>> {
        self.check_available()?;
        let mut state = self.lock();

        if !state.pending.is_empty() {
            return Ok(state.pending.iter().take(max).cloned().collect());
        }

        let take = max.min(state.ready.len());
        let batch: Vec<QueueMessage> = state.ready.drain(..take).collect();
        state.pending.extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn ack(&self, message_ids: &[String]) -> QueueResult<()> {
        self.check_available()?;
        self.lock()
            .pending
            .retain(|m| !message_ids.contains(&m.message_id));
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
