//! API route configuration.
//!
//! Every endpoint expects the caller headers described in
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{create_short_url_handler, list_short_urls_handler, metrics_handler};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Routes nested under `/api`.
///
/// # Endpoints
///
/// - `POST /short-urls`      - Create a short URL
/// - `GET  /short-urls`      - List the caller's codes
/// - `GET  /metrics/{code}`  - Daily rollups for one of the caller's codes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/short-urls",
            get(list_short_urls_handler).post(create_short_url_handler),
        )
        .route("/metrics/{code}", get(metrics_handler))
}
