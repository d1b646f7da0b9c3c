//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: store, queue and event buffer are healthy
/// - **503 Service Unavailable**: one of them is not
///
/// The cache is reported but does not fail the check: redirects keep
/// working from the store without it.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "store": { "status": "ok", "message": "Connected" },
///     "cache": { "status": "ok", "message": "Connected" },
///     "queue": { "status": "ok", "message": "Connected" },
///     "event_buffer": { "status": "ok", "message": "Free slots: 10000" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store = check_status(state.short_urls.health_check().await, "Store");
    let cache = check_status(state.cache.health_check().await, "Cache");
    let queue = check_status(state.queue.health_check().await, "Queue");
    let event_buffer = check_event_buffer(&state);

    let healthy = store.is_ok() && queue.is_ok() && event_buffer.is_ok();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            store,
            cache,
            queue,
            event_buffer,
        },
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

fn check_status(healthy: bool, component: &str) -> CheckStatus {
    if healthy {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error(format!("{component} unreachable"))
    }
}

fn check_event_buffer(state: &AppState) -> CheckStatus {
    if state.metrics_emitter.is_closed() {
        CheckStatus::error("Event publisher stopped")
    } else {
        CheckStatus::ok(format!(
            "Free slots: {}",
            state.metrics_emitter.remaining_capacity()
        ))
    }
}
