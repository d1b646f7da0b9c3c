//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, FromRequestParts, Path, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::application::services::RateDecision;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_meta::access_event;
use crate::utils::url_normalizer::ensure_scheme;

/// Socket peer, when the server was started with connect info.
pub struct PeerAddr(pub Option<SocketAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PeerAddr(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// Redirects a short code to its target.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Per-code rate limit (malformed codes stop here with 404)
/// 2. Resolve through the cache, falling back to the store
/// 3. Hand an access event to the emitter (never blocks)
/// 4. `302 Found` with `Location` set to the target; `https://` is added
///    only when the stored target has no scheme
///
/// Rate-limited requests are answered with 429 and still produce an access
/// event. Unknown codes produce none.
///
/// # Errors
///
/// - 404 if the code is malformed or unknown
/// - 429 if the code's window quota is used up
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    PeerAddr(peer): PeerAddr,
) -> Result<Response, AppError> {
    let emit = || {
        let event = access_event(
            &code,
            &headers,
            peer,
            state.behind_proxy,
            Utc::now().timestamp(),
        );
        state.metrics_emitter.emit(event);
    };

    let decision = match state.rate_limiter.check(&code).await {
        Ok(decision) => decision,
        Err(e) => {
            metrics::counter!("redirects_total", "outcome" => "not_found").increment(1);
            return Err(e);
        }
    };

    if let RateDecision::Limited { count, limit } = decision {
        metrics::counter!("redirects_total", "outcome" => "rate_limited").increment(1);
        emit();
        return Err(AppError::rate_limited(
            "Too many requests for this short URL",
            json!({ "code": code, "count": count, "limit": limit }),
        ));
    }

    let target = match state.link_service.resolve(&code).await {
        Ok(target) => target,
        Err(e) => {
            let outcome = if matches!(e, AppError::NotFound { .. }) {
                "not_found"
            } else {
                "error"
            };
            metrics::counter!("redirects_total", "outcome" => outcome).increment(1);
            return Err(e);
        }
    };

    metrics::counter!("redirects_total", "outcome" => "redirected").increment(1);
    emit();

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, ensure_scheme(&target).into_owned())],
    )
        .into_response())
}
