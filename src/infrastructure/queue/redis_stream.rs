//! Redis Stream implementation of the event queue.

use super::service::{EventQueue, QueueError, QueueMessage, QueueResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Field holding the JSON body of each stream entry.
const BODY_FIELD: &str = "body";

/// XREADGROUP reply: stream → entries; an entry's field map is nil when the
/// entry was trimmed while still pending.
type StreamReply = Option<Vec<(String, Vec<(String, Option<HashMap<String, String>>)>)>>;

/// Stream naming for one consumer.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub stream: String,
    pub group: String,
    pub consumer: String,
    /// Approximate cap on the stream length (`MAXLEN ~`).
    pub max_len: usize,
}

/// Queue over a Redis Stream read through a consumer group.
///
/// Delivered entries stay in the consumer's pending list until `XACK`ed.
/// [`EventQueue::receive`] first re-reads this consumer's pending entries
/// (id `0`) and only asks for new ones (id `>`) once none are left, which
/// gives redelivery of failed messages without a separate claim step.
pub struct RedisStreamQueue {
    conn: ConnectionManager,
    settings: StreamSettings,
    timeout: Duration,
}

impl RedisStreamQueue {
    /// Wraps a connection and creates the consumer group (and the stream)
    /// if they do not exist yet.
    pub async fn new(
        conn: ConnectionManager,
        settings: StreamSettings,
        timeout: Duration,
    ) -> QueueResult<Self> {
        let queue = Self {
            conn,
            settings,
            timeout,
        };
        queue.ensure_group().await?;
        info!(
            stream = %queue.settings.stream,
            group = %queue.settings.group,
            consumer = %queue.settings.consumer,
            "Metrics stream ready"
        );
        Ok(queue)
    }

    async fn ensure_group(&self) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("XGROUP");
        cmd.arg("CREATE")
            .arg(&self.settings.stream)
            .arg(&self.settings.group)
            .arg("0")
            .arg("MKSTREAM");

        match tokio::time::timeout(self.timeout, cmd.query_async::<()>(&mut conn)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.code() == Some("BUSYGROUP") => Ok(()),
            Ok(Err(e)) => Err(QueueError::Connection(e.to_string())),
            Err(_) => Err(QueueError::Timeout),
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> QueueResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(QueueError::Operation(e.to_string())),
            Err(_) => Err(QueueError::Timeout),
        }
    }

    /// Reads up to `max` entries after `id`. Entries without a body are
    /// acknowledged on the spot; there is nothing left to process.
    async fn read(&self, id: &str, max: usize) -> QueueResult<Vec<QueueMessage>> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.settings.group)
            .arg(&self.settings.consumer)
            .arg("COUNT")
            .arg(max)
            .arg("STREAMS")
            .arg(&self.settings.stream)
            .arg(id);

        let reply: StreamReply = self.bounded(cmd.query_async(&mut conn)).await?;

        let mut messages = Vec::new();
        let mut empty = Vec::new();
        for (_stream, entries) in reply.unwrap_or_default() {
            for (entry_id, fields) in entries {
                match fields.and_then(|mut f| f.remove(BODY_FIELD)) {
                    Some(body) => messages.push(QueueMessage::new(entry_id, body)),
                    None => empty.push(entry_id),
                }
            }
        }

        if !empty.is_empty() {
            warn!(count = empty.len(), "Acknowledging stream entries without body");
            self.ack(&empty).await?;
        }

        Ok(messages)
    }
}

#[async_trait]
impl EventQueue for RedisStreamQueue {
    async fn publish(&self, body: &str) -> QueueResult<String> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.settings.stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.settings.max_len)
            .arg("*")
            .arg(BODY_FIELD)
            .arg(body);

        let id: String = self.bounded(cmd.query_async(&mut conn)).await?;
        debug!(message_id = %id, "Access event published");
        Ok(id)
    }

    async fn receive(&self, max: usize) -> QueueResult<Vec<QueueMessage>> {
        let pending = self.read("0", max).await?;
        if !pending.is_empty() {
            debug!(count = pending.len(), "Redelivering pending entries");
            return Ok(pending);
        }
        self.read(">", max).await
    }

    async fn ack(&self, message_ids: &[String]) -> QueueResult<()> {
        if message_ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("XACK");
        cmd.arg(&self.settings.stream)
            .arg(&self.settings.group)
            .arg(message_ids);

        let acked: u64 = self.bounded(cmd.query_async(&mut conn)).await?;
        debug!(acked, "Stream entries acknowledged");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        let cmd = redis::cmd("PING");
        self.bounded(cmd.query_async::<String>(&mut conn))
            .await
            .is_ok()
    }
}
