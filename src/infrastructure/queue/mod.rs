//! Durable queue between the metrics emitter and the aggregator.
//!
//! - [`RedisStreamQueue`] - Redis Stream read through a consumer group
//! - [`crate::infrastructure::memory::MemoryQueue`] - in-process stand-in

mod redis_stream;
mod service;

pub use redis_stream::{RedisStreamQueue, StreamSettings};
pub use service::{EventQueue, QueueError, QueueMessage, QueueResult};
