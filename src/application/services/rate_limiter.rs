//! Per-code fixed-window rate limiting.
//!
//! Each (code, window) pair owns one self-expiring counter:
//!
//! ```text
//! window_start = now - now % window
//! key          = rl:<code>:<window_start>
//! ```
//!
//! A burst straddling a window boundary can reach twice the threshold.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::domain::tier::Tier;
use crate::error::AppError;
use crate::infrastructure::cache::RateWindowStore;
use crate::utils::code_encoder::CodeEncoder;

const WINDOW_KEY_PREFIX: &str = "rl";

/// Window length and per-tier thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window_seconds: u64,
    pub standard_limit: u64,
    pub premium_limit: u64,
}

impl RateLimitPolicy {
    pub fn threshold(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Standard => self.standard_limit,
            Tier::Premium => self.premium_limit,
        }
    }

    pub fn window_start(&self, now_unix: i64) -> i64 {
        let window = i64::try_from(self.window_seconds.max(1)).unwrap_or(i64::MAX);
        now_unix - now_unix.rem_euclid(window)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window_seconds: 60,
            standard_limit: 100,
            premium_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { count: u64, limit: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

pub fn window_key(code: &str, window_start: i64) -> String {
    format!("{WINDOW_KEY_PREFIX}:{code}:{window_start}")
}

pub struct RateLimiter {
    store: Arc<dyn RateWindowStore>,
    encoder: Arc<CodeEncoder>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn RateWindowStore>,
        encoder: Arc<CodeEncoder>,
        policy: RateLimitPolicy,
    ) -> Self {
        Self {
            store,
            encoder,
            policy,
        }
    }

    pub async fn check(&self, code: &str) -> Result<RateDecision, AppError> {
        self.check_at(code, Utc::now().timestamp()).await
    }

    /// Counts one hit for `code` in the window containing `now_unix`.
    ///
    /// If the window store is unreachable the request is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for a malformed code; no counter is
    /// touched in that case.
    pub async fn check_at(&self, code: &str, now_unix: i64) -> Result<RateDecision, AppError> {
        let parsed = self.encoder.parse_short_code(code).ok_or_else(|| {
            AppError::not_found("Short URL not found", json!({ "code": code }))
        })?;

        let limit = self.policy.threshold(parsed.tier);
        let key = window_key(code, self.policy.window_start(now_unix));

        let count = match self.store.incr(&key).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(code, error = %e, "Rate window store unavailable, allowing request");
                return Ok(RateDecision::Allowed);
            }
        };

        if count == 1
            && let Err(e) = self.store.expire(&key, self.policy.window_seconds).await
        {
            tracing::warn!(key = %key, error = %e, "Failed to set rate window expiry");
        }

        if count <= limit {
            Ok(RateDecision::Allowed)
        } else {
            tracing::debug!(code, count, limit, "Rate limit exceeded");
            Ok(RateDecision::Limited { count, limit })
        }
    }
}
