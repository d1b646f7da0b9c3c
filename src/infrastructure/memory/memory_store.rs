//! In-process implementation of both repositories.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::entities::{DailyGroup, DailyMetric, MetricCounts, NewShortUrl, ShortUrlRecord};
use crate::domain::repositories::{MetricsRepository, ShortUrlRepository, UpsertOutcome};
use crate::error::AppError;

#[derive(Default)]
struct StoreState {
    records: HashMap<String, ShortUrlRecord>,
    /// (owner_id, code)
    owner_index: BTreeSet<(String, String)>,
    counter: u64,
    rollups: BTreeMap<(String, NaiveDate), MetricCounts>,
    /// (code, event key)
    applied: HashSet<(String, String)>,
}

/// Keeps the same atomicity contract as the PostgreSQL repositories: every
/// operation runs under one lock, so dual writes and rollup upserts are all
/// or nothing.
///
/// [`MemoryStore::set_available`] simulates an outage: while unavailable
/// every call fails with [`AppError::TransientIo`] (or
/// [`UpsertOutcome::Failed`]).
pub struct MemoryStore {
    state: Mutex<StoreState>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Current rollup for (code, day), if any.
    pub fn rollup(&self, code: &str, day: NaiveDate) -> Option<MetricCounts> {
        self.lock().rollups.get(&(code.to_string(), day)).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::transient("Store unavailable", json!({})))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShortUrlRepository for MemoryStore {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrlRecord, AppError> {
        self.check_available()?;
        let mut state = self.lock();

        let index_key = (new_url.owner_id.clone(), new_url.code.clone());
        if state.records.contains_key(&new_url.code) || state.owner_index.contains(&index_key) {
            return Err(AppError::duplicate_code(
                "Short code already exists",
                json!({ "code": new_url.code }),
            ));
        }

        let record = new_url.into_record(Utc::now());
        state.records.insert(record.code.clone(), record.clone());
        state.owner_index.insert(index_key);
        Ok(record)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortUrlRecord>, AppError> {
        self.check_available()?;
        Ok(self.lock().records.get(code).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<String>, AppError> {
        self.check_available()?;
        Ok(self
            .lock()
            .owner_index
            .iter()
            .filter(|(owner, _)| owner == owner_id)
            .map(|(_, code)| code.clone())
            .collect())
    }

    async fn next_counter(&self) -> Result<u64, AppError> {
        self.check_available()?;
        let mut state = self.lock();
        state.counter += 1;
        Ok(state.counter)
    }

    async fn health_check(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsRepository for MemoryStore {
    async fn upsert_daily(&self, group: &DailyGroup) -> UpsertOutcome {
        if let Err(e) = self.check_available() {
            return UpsertOutcome::Failed(e.to_string());
        }
        let mut state = self.lock();

        let fresh: HashSet<String> = group
            .event_keys()
            .filter(|key| {
                !state
                    .applied
                    .contains(&(group.code.clone(), (*key).to_string()))
            })
            .map(str::to_owned)
            .collect();

        if fresh.is_empty() {
            return UpsertOutcome::AlreadyApplied;
        }

        let counts = group.counts_where(|key| fresh.contains(key));
        for key in fresh {
            state.applied.insert((group.code.clone(), key));
        }

        match state.rollups.entry((group.code.clone(), group.day)) {
            Entry::Vacant(slot) => {
                slot.insert(counts);
                UpsertOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                slot.get_mut().merge(&counts);
                UpsertOutcome::Merged
            }
        }
    }

    async fn daily_range(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyMetric>, AppError> {
        self.check_available()?;
        let code = code.to_string();
        Ok(self
            .lock()
            .rollups
            .range((code.clone(), from)..=(code.clone(), to))
            .map(|((code, day), counts)| DailyMetric {
                code: code.clone(),
                day: *day,
                counts: counts.clone(),
            })
            .collect())
    }

    async fn purge_expired_markers(&self) -> Result<u64, AppError> {
        self.check_available()?;
        Ok(0)
    }
}
