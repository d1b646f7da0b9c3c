//! Access event metadata read from HTTP request headers.

use axum::http::{HeaderMap, header};
use std::net::SocketAddr;

use crate::domain::entities::{AccessEvent, DeviceClass};

pub const UNKNOWN: &str = "unknown";

const VIEWER_COUNTRY: &str = "cloudfront-viewer-country";
const IS_MOBILE_VIEWER: &str = "cloudfront-is-mobile-viewer";
const IS_SMART_TV_VIEWER: &str = "cloudfront-is-smarttv-viewer";
const IS_TABLET_VIEWER: &str = "cloudfront-is-tablet-viewer";

fn header_str<'a>(headers: &'a HeaderMap, name: impl header::AsHeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn is_true(headers: &HeaderMap, name: &str) -> bool {
    header_str(headers, name).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Client address for the event.
///
/// With `behind_proxy`, the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Otherwise (or if neither is present) the socket peer is
/// used. Falls back to `unknown`.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
/// assert_eq!(client_ip(&headers, None, true), "203.0.113.9");
/// ```
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = header_str(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded.or_else(|| header_str(headers, "x-real-ip")) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Device class from the viewer headers; desktop when none is set.
pub fn device_class(headers: &HeaderMap) -> DeviceClass {
    if is_true(headers, IS_MOBILE_VIEWER) {
        DeviceClass::Mobile
    } else if is_true(headers, IS_SMART_TV_VIEWER) {
        DeviceClass::SmartTv
    } else if is_true(headers, IS_TABLET_VIEWER) {
        DeviceClass::Tablet
    } else {
        DeviceClass::Desktop
    }
}

pub fn viewer_country(headers: &HeaderMap) -> String {
    header_str(headers, VIEWER_COUNTRY)
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Builds the access event for a redirect of `code` at `timestamp`.
pub fn access_event(
    code: &str,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    behind_proxy: bool,
    timestamp: i64,
) -> AccessEvent {
    AccessEvent {
        code: code.to_string(),
        client_ip: client_ip(headers, peer, behind_proxy),
        timestamp,
        referrer: header_str(headers, header::REFERER).map(str::to_string),
        user_agent: header_str(headers, header::USER_AGENT)
            .unwrap_or(UNKNOWN)
            .to_string(),
        country: viewer_country(headers),
        device_class: device_class(headers),
        event_id: None,
    }
}
