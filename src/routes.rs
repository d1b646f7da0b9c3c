//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`   - Short URL redirect (public, per-code quota)
//! - `GET  /health`   - Health check: store, cache, queue, event buffer
//! - `/api/*`         - Management API (caller headers required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Routes without the per-IP `/api` limiter, for tests and embedding.
pub fn base_router(state: AppState) -> Router {
    router_with_api(state, api::routes::api_routes())
}

/// Constructs the application router with all routes and middleware.
///
/// # Errors
///
/// Fails if the `/api` rate limit settings are invalid.
pub fn app_router(
    state: AppState,
    api_rate_per_second: u64,
    api_rate_burst: u32,
) -> anyhow::Result<NormalizePath<Router>> {
    let api_router =
        api::routes::api_routes().layer(rate_limit::layer(api_rate_per_second, api_rate_burst)?);

    let router = router_with_api(state, api_router);

    Ok(NormalizePathLayer::trim_trailing_slash().layer(router))
}

fn router_with_api(state: AppState, api_router: Router<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
