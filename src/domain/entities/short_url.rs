//! Short URL record: the durable code → target mapping.

use chrono::{DateTime, Utc};

/// A stored short URL.
///
/// Records are immutable once created: there is no update or delete path,
/// which is what lets the resolution cache skip invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrlRecord {
    pub code: String,
    /// Target as submitted, trimmed; may lack a scheme.
    pub target_url: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Input data for creating a new short URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortUrl {
    pub code: String,
    pub target_url: String,
    pub owner_id: String,
}

impl NewShortUrl {
    pub fn into_record(self, created_at: DateTime<Utc>) -> ShortUrlRecord {
        ShortUrlRecord {
            code: self.code,
            target_url: self.target_url,
            owner_id: self.owner_id,
            created_at,
        }
    }
}
