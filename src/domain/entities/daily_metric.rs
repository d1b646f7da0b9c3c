//! Per-day access rollups and the event groups that feed them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::access_event::AccessEvent;

/// Additive counters of one (code, day) rollup.
///
/// Merging is plain addition, so the result of applying any set of events
/// does not depend on the order they arrive in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCounts {
    pub total_hits: u64,
    #[serde(default)]
    pub by_country: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_device_type: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_referrer: BTreeMap<String, u64>,
}

impl MetricCounts {
    pub fn record(&mut self, event: &AccessEvent) {
        self.total_hits += 1;
        *self.by_country.entry(event.country.clone()).or_insert(0) += 1;
        *self
            .by_device_type
            .entry(event.device_class.as_str().to_string())
            .or_insert(0) += 1;
        *self
            .by_referrer
            .entry(event.referrer_key().to_string())
            .or_insert(0) += 1;
    }

    /// Adds `other` into `self`; keys missing on either side count as zero.
    pub fn merge(&mut self, other: &MetricCounts) {
        self.total_hits += other.total_hits;
        for (target, source) in [
            (&mut self.by_country, &other.by_country),
            (&mut self.by_device_type, &other.by_device_type),
            (&mut self.by_referrer, &other.by_referrer),
        ] {
            for (key, count) in source {
                *target.entry(key.clone()).or_insert(0) += count;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_hits == 0
    }
}

impl<'a> FromIterator<&'a AccessEvent> for MetricCounts {
    fn from_iter<I: IntoIterator<Item = &'a AccessEvent>>(iter: I) -> Self {
        let mut counts = MetricCounts::default();
        for event in iter {
            counts.record(event);
        }
        counts
    }
}

/// Durable rollup for one short code on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub code: String,
    pub day: NaiveDate,
    #[serde(flatten)]
    pub counts: MetricCounts,
}

/// Events of one batch that share a (code, day) key.
///
/// Events are deduplicated on insertion; every message id is kept so the
/// whole group can be reported for redelivery when its write fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyGroup {
    pub code: String,
    pub day: NaiveDate,
    events: Vec<(String, AccessEvent)>,
    seen: HashSet<String>,
    message_ids: Vec<String>,
}

impl DailyGroup {
    pub fn new(code: impl Into<String>, day: NaiveDate) -> Self {
        Self {
            code: code.into(),
            day,
            events: Vec::new(),
            seen: HashSet::new(),
            message_ids: Vec::new(),
        }
    }

    /// Adds a delivered event. Returns `false` when an identical event was
    /// already part of the group.
    pub fn push(&mut self, message_id: impl Into<String>, event: AccessEvent) -> bool {
        self.message_ids.push(message_id.into());
        let key = event.dedup_key();
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.events.push((key, event));
        true
    }

    pub fn event_keys(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|(key, _)| key.as_str())
    }

    /// Counters of the events whose key satisfies `keep`.
    pub fn counts_where<F: Fn(&str) -> bool>(&self, keep: F) -> MetricCounts {
        self.events
            .iter()
            .filter(|(key, _)| keep(key))
            .map(|(_, event)| event)
            .collect()
    }

    pub fn counts(&self) -> MetricCounts {
        self.counts_where(|_| true)
    }

    pub fn message_ids(&self) -> &[String] {
        &self.message_ids
    }

    /// Distinct events in the group.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}
