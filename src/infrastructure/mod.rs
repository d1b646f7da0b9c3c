//! Infrastructure layer for external integrations.
//!
//! Implements the ports defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - Redis resolution cache, primary counter and rate windows
//! - [`queue`] - durable metrics queue (Redis Streams)
//! - [`persistence`] - PostgreSQL repositories over the keyed-entity table
//! - [`memory`] - in-process stand-ins for all of the above

pub mod cache;
pub mod memory;
pub mod persistence;
pub mod queue;
