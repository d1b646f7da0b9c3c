//! HTTP request/response tracing middleware.
//!
//! Every request gets a span carrying a fresh request id, the method and
//! the path. Redirect paths contain the short code, so one code's traffic
//! can be followed across the handler, the rate limiter and the event
//! buffer logs.
//!
//! ```text
//! INFO request{id=5d0c… method=GET path=/stdAb3xK9q}: finished processing request latency=2 ms status=302
//! WARN request{id=91e2… method=GET path=/stdAb3xK9q}: response failed classification=Status code: 503 latency=2001 ms
//! ```

use axum::body::Body;
use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};
use uuid::Uuid;

type MakeSpan = fn(&Request<Body>) -> Span;

/// Creates the tracing layer applied to the whole router.
pub fn layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    MakeSpan,
    (),
    DefaultOnResponse,
    (),
    (),
    DefaultOnFailure,
> {
    TraceLayer::new_for_http()
        .make_span_with(request_span as MakeSpan)
        .on_request(())
        .on_body_chunk(())
        .on_eos(())
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(
            DefaultOnFailure::new()
                .level(Level::WARN)
                .latency_unit(LatencyUnit::Millis),
        )
}

fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    )
}
