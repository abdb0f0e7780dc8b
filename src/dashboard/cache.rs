//! Time-limited cache of the loaded dataset.
//!
//! The cache never reads the clock itself: callers pass `now`, which keeps
//! expiry deterministic under test.

use crate::types::anomaly::AnomalyRecord;
use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

pub type Records = Arc<Vec<AnomalyRecord>>;

#[derive(Debug, Clone)]
struct CachedDataset {
    records: Records,
    loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DatasetCache {
    ttl: TimeDelta,
    entry: Option<CachedDataset>,
}

impl DatasetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            entry: None,
        }
    }

    /// Returns the cached records if they were loaded less than `ttl` before `now`.
    ///
    /// An entry stamped in the future (clock moved backwards) is treated as stale.
    pub fn lookup(&self, now: DateTime<Utc>) -> Option<Records> {
        let entry = self.entry.as_ref()?;
        let age = now - entry.loaded_at;
        if age >= TimeDelta::zero() && age < self.ttl {
            debug!("Dataset cache hit (age {} s)", age.num_seconds());
            Some(Arc::clone(&entry.records))
        } else {
            debug!("Dataset cache expired (age {} s)", age.num_seconds());
            None
        }
    }

    /// Replaces the cached records, stamping them with `now`.
    pub fn insert(&mut self, records: Vec<AnomalyRecord>, now: DateTime<Utc>) -> Records {
        let records = Arc::new(records);
        self.entry = Some(CachedDataset {
            records: Arc::clone(&records),
            loaded_at: now,
        });
        records
    }

    /// Returns fresh cached records or loads, stores and returns new ones.
    pub fn get_or_load<F>(&mut self, now: DateTime<Utc>, load: F) -> Records
    where
        F: FnOnce() -> Vec<AnomalyRecord>,
    {
        match self.lookup(now) {
            Some(records) => records,
            None => self.insert(load(), now),
        }
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|e| e.loaded_at)
    }
}
