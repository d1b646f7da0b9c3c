//! Caller identity injected by the upstream auth gateway.
//!
//! Token verification happens before requests reach this service. The
//! gateway forwards the verified identity in two headers, which are trusted
//! as-is:
//!
//! ```text
//! X-Owner-Id: <owner id>
//! X-Subscription-Tier: std | pro
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::json;

use crate::domain::tier::Tier;
use crate::error::AppError;

pub const OWNER_HEADER: &str = "x-owner-id";
pub const TIER_HEADER: &str = "x-subscription-tier";

/// Authenticated caller of an `/api` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub owner_id: String,
    pub tier: Tier,
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    /// # Errors
    ///
    /// Returns `401 Unauthorized` if either header is missing, not UTF-8,
    /// empty, or names an unknown tier.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner_id = header_value(parts, OWNER_HEADER)?;
        let tier_raw = header_value(parts, TIER_HEADER)?;

        let tier = tier_raw.parse::<Tier>().map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Unknown subscription tier", "tier": tier_raw }),
            )
        })?;

        Ok(Caller { owner_id, tier })
    }
}

fn header_value(parts: &Parts, name: &str) -> Result<String, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": format!("{name} header is missing or invalid") }),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(headers: &[(&str, &str)]) -> Result<Caller, AppError> {
        let mut builder = Request::builder().uri("/api/short-urls");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_caller_from_headers() {
        let caller = extract(&[(OWNER_HEADER, "alice"), (TIER_HEADER, "pro")])
            .await
            .unwrap();
        assert_eq!(
            caller,
            Caller {
                owner_id: "alice".to_string(),
                tier: Tier::Premium
            }
        );
    }

    #[tokio::test]
    async fn test_missing_owner_is_unauthorized() {
        let err = extract(&[(TIER_HEADER, "std")]).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_unknown_tier_is_unauthorized() {
        let err = extract(&[(OWNER_HEADER, "alice"), (TIER_HEADER, "gold")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_blank_owner_is_unauthorized() {
        let err = extract(&[(OWNER_HEADER, "  "), (TIER_HEADER, "std")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }
}
