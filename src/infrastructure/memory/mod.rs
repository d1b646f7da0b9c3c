//! In-process backends.
//!
//! Used by the test suite and by single-node runs without Redis (the
//! metrics queue falls back to [`MemoryQueue`]). Each keeps the atomicity
//! contract of the backend it replaces and can simulate an outage.

mod memory_cache;
mod memory_queue;
mod memory_store;

pub use memory_cache::MemoryCache;
pub use memory_queue::MemoryQueue;
pub use memory_store::MemoryStore;
