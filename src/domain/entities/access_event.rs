//! Access event model carried on the metrics queue.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Breakdown key used when a request carried no referrer.
pub const NO_REFERRER: &str = "none";

/// Coarse device classification derived from viewer headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Desktop,
    Mobile,
    SmartTv,
    Tablet,
}

impl DeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::Desktop => "desktop",
            DeviceClass::Mobile => "mobile",
            DeviceClass::SmartTv => "smart_tv",
            DeviceClass::Tablet => "tablet",
        }
    }
}

/// One redirect attempt, as published by the emitter and consumed by the
/// aggregator.
///
/// Serialized as JSON. The queue's delivery-scoped message id is *not* part
/// of the event; see [`crate::infrastructure::queue::QueueMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    /// Short code that was requested.
    #[serde(rename = "url")]
    pub code: String,
    #[serde(rename = "ip")]
    pub client_ip: String,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub referrer: Option<String>,
    pub user_agent: String,
    pub country: String,
    #[serde(rename = "device")]
    pub device_class: DeviceClass,
    /// Identity assigned at emission; absent in events from older producers.
    #[serde(default)]
    pub event_id: Option<Uuid>,
}

impl AccessEvent {
    /// UTC calendar day of the event's own timestamp.
    ///
    /// Returns `None` for timestamps outside the representable range.
    pub fn day(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp(self.timestamp, 0).map(|dt| dt.date_naive())
    }

    /// Stable identity used to drop duplicate deliveries.
    ///
    /// The emitter-assigned `event_id` when present, otherwise a SHA-256
    /// digest of the event content.
    pub fn dedup_key(&self) -> String {
        if let Some(id) = self.event_id {
            return id.simple().to_string();
        }

        let timestamp = self.timestamp.to_string();
        let mut hasher = Sha256::new();
        for part in [
            self.code.as_str(),
            self.client_ip.as_str(),
            timestamp.as_str(),
            self.referrer.as_deref().unwrap_or(""),
            self.user_agent.as_str(),
            self.country.as_str(),
            self.device_class.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0x1f]);
        }
        format!("h{}", hex::encode(hasher.finalize()))
    }

    pub fn referrer_key(&self) -> &str {
        match self.referrer.as_deref() {
            Some(r) if !r.is_empty() => r,
            _ => NO_REFERRER,
        }
    }
}
