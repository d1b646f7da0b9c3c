//! HTTP middleware and request extractors.
//!
//! Provides caller identity, API rate limiting, and observability.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
