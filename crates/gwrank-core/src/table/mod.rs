//! Endpoint state table.
//!
//! An arena of [`EndpointRecord`]s indexed by URL, in insertion order. Records
//! are created from the seed lists (or on first encounter) and then changed
//! only through [`EndpointTable::apply`], which runs the scoring engine. The
//! table is persisted as JSON after every batch; loading reconciles each
//! record field by field so a damaged file never stops a campaign.

mod error;
mod persist;
mod seed;
mod snapshot;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::StalePolicy;
use crate::probe::Measurement;
use crate::scoring::{EndpointRecord, ScoringEngine};

pub use error::StoreError;
pub use seed::{parse_list, SeedLists};
pub use snapshot::{from_snapshot, PersistedRecord, PersistedTable, SNAPSHOT_VERSION};

/// Counts from [`EndpointTable::reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub pruned: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointTable {
    records: Vec<EndpointRecord>,
    index: HashMap<String, usize>,
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh table: primaries first, then secondaries not already present.
    pub fn from_seeds(seeds: &SeedLists) -> Self {
        let mut table = Self::new();
        for (url, is_primary) in seeds.entries() {
            table.insert(EndpointRecord::new(url, is_primary));
        }
        table
    }

    /// Adds a record unless its URL is already present. Returns whether it was added.
    pub fn insert(&mut self, record: EndpointRecord) -> bool {
        if self.index.contains_key(&record.url) {
            return false;
        }
        self.index.insert(record.url.clone(), self.records.len());
        self.records.push(record);
        true
    }

    /// Returns the record for `url`, creating it with the given flag on first encounter.
    pub fn ensure(&mut self, url: &str, is_primary: bool) -> &EndpointRecord {
        let idx = match self.index.get(url) {
            Some(&idx) => idx,
            None => {
                self.insert(EndpointRecord::new(url, is_primary));
                self.records.len() - 1
            }
        };
        &self.records[idx]
    }

    pub fn get(&self, url: &str) -> Option<&EndpointRecord> {
        self.index.get(url).map(|&idx| &self.records[idx])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[EndpointRecord] {
        &self.records
    }

    pub fn urls(&self) -> Vec<String> {
        self.records.iter().map(|r| r.url.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Scores one measurement into the record for `url`. Unknown URLs are ignored.
    pub fn apply(
        &mut self,
        url: &str,
        measurement: &Measurement,
        engine: &ScoringEngine,
    ) -> Option<&EndpointRecord> {
        self.apply_at(url, measurement, engine, Utc::now())
    }

    pub fn apply_at(
        &mut self,
        url: &str,
        measurement: &Measurement,
        engine: &ScoringEngine,
        at: DateTime<Utc>,
    ) -> Option<&EndpointRecord> {
        let idx = *self.index.get(url)?;
        let updated = engine.update_at(&self.records[idx], measurement, at);
        self.records[idx] = updated;
        Some(&self.records[idx])
    }

    /// Brings the table in line with the seed lists: new URLs are added (existing
    /// records keep their primary flag), and with [`StalePolicy::Prune`] records
    /// on neither list are dropped.
    pub fn reconcile(&mut self, seeds: &SeedLists, policy: StalePolicy) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for (url, is_primary) in seeds.entries() {
            if self.insert(EndpointRecord::new(url, is_primary)) {
                report.added += 1;
            }
        }
        if policy == StalePolicy::Prune && !seeds.is_empty() {
            let before = self.records.len();
            self.records.retain(|r| seeds.contains(&r.url));
            report.pruned = before - self.records.len();
            if report.pruned > 0 {
                self.reindex();
            }
        }
        report
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.url.clone(), i))
            .collect();
    }
}
