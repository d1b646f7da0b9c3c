//! Per-client token bucket in front of the `/api` routes.
//!
//! This protects the management API from request floods. It is unrelated
//! to the per-code redirect quota in
//! [`crate::application::services::RateLimiter`].

use anyhow::Context;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

pub type ApiGovernorLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Token bucket keyed by socket peer IP.
///
/// Requests over the limit receive `429 Too Many Requests`. The peer
/// address comes from `ConnectInfo`, so the router must be served with
/// `into_make_service_with_connect_info`.
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/short-urls", post(create_short_url_handler))
///     .layer(rate_limit::layer(2, 50)?);
/// ```
///
/// # Errors
///
/// Fails if `per_second` or `burst` is zero.
pub fn layer(per_second: u64, burst: u32) -> anyhow::Result<ApiGovernorLayer> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(per_second)
            .burst_size(burst)
            .finish()
            .context("Invalid API rate limit settings")?,
    );

    Ok(GovernorLayer::new(governor_conf))
}
