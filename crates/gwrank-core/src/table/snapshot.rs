//! Serializable snapshot of the endpoint table and field-by-field recovery on load.

use std::collections::{BTreeMap, VecDeque};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::scoring::{EndpointRecord, LastMeasurement, ScoringParams};

use super::EndpointTable;

pub const SNAPSHOT_VERSION: u8 = 1;

/// On-disk form used for writing: `{"version": 1, "gateways": {url: record}}`.
#[derive(Debug, Serialize)]
pub(super) struct SnapshotRef<'a> {
    pub version: u8,
    pub gateways: BTreeMap<&'a str, &'a EndpointRecord>,
}

/// On-disk form used for reading. Each gateway is kept as raw JSON so one
/// damaged entry cannot fail the whole document.
#[derive(Debug, Deserialize)]
pub struct PersistedTable {
    #[serde(default = "default_version")]
    pub version: u8,
    #[serde(default)]
    pub gateways: BTreeMap<String, serde_json::Value>,
}

fn default_version() -> u8 {
    SNAPSHOT_VERSION
}

/// One persisted gateway with every field optional. A field that is missing,
/// null or of the wrong type reads as `None` and is backfilled from a fresh record.
#[derive(Debug, Default, Deserialize)]
pub struct PersistedRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub is_primary: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub success_ema: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_measurement: Option<LastMeasurement>,
    #[serde(default, deserialize_with = "lenient")]
    pub throughput_history: Option<VecDeque<f64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub weight_history: Option<VecDeque<f64>>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_attempts: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub valid_test_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub success_count: Option<u64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl PersistedRecord {
    /// Rebuilds a record for `url`, taking each present field over the fresh default,
    /// then reconciling the invariants.
    pub fn into_record(self, url: &str, params: &ScoringParams) -> EndpointRecord {
        let mut record = EndpointRecord::new(url, self.is_primary.unwrap_or(false));
        if let Some(v) = self.success_ema {
            record.success_ema = v;
        }
        if let Some(v) = self.weight {
            record.weight = v;
        }
        record.last_measurement = self.last_measurement;
        if let Some(v) = self.throughput_history {
            record.throughput_history = v;
        }
        if let Some(v) = self.weight_history {
            record.weight_history = v;
        }
        if let Some(v) = self.total_attempts {
            record.total_attempts = v;
        }
        if let Some(v) = self.valid_test_count {
            record.valid_test_count = v;
        }
        if let Some(v) = self.success_count {
            record.success_count = v;
        }
        record.sanitized(params.w_min(), params.history_len())
    }
}

pub(super) fn to_snapshot(table: &EndpointTable) -> SnapshotRef<'_> {
    SnapshotRef {
        version: SNAPSHOT_VERSION,
        gateways: table
            .records
            .iter()
            .map(|r| (r.url.as_str(), r))
            .collect(),
    }
}

/// Restores a table from a parsed snapshot. Map keys are the identity; an entry
/// that is not a JSON object is rebuilt as a fresh secondary record.
pub fn from_snapshot(snapshot: PersistedTable, params: &ScoringParams) -> EndpointTable {
    let mut table = EndpointTable::new();
    for (url, raw) in snapshot.gateways {
        let persisted = match serde_json::from_value::<PersistedRecord>(raw) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(%url, error = %e, "unreadable gateway entry, resetting");
                PersistedRecord::default()
            }
        };
        table.insert(persisted.into_record(&url, params));
    }
    table
}
