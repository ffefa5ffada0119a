//! Persist the endpoint table to disk as JSON so scores survive across runs.

use std::path::Path;

use crate::config::StalePolicy;
use crate::scoring::ScoringParams;

use super::snapshot::{self, PersistedTable};
use super::{EndpointTable, SeedLists, StoreError};

impl EndpointTable {
    /// Writes the table as pretty JSON, creating the parent dir if needed.
    /// The file is replaced atomically through a sibling temp file.
    pub fn save_to_path(&self, path: &Path) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&snapshot::to_snapshot(self))
            .map_err(StoreError::Serialize)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(write_err)?;
        Ok(())
    }

    /// Loads the table from `path`. A missing file is `Ok(None)`; an unreadable
    /// or unparsable document is an error. Individual damaged records are repaired.
    pub fn load_from_path(
        path: &Path,
        params: &ScoringParams,
    ) -> Result<Option<EndpointTable>, StoreError> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let persisted: PersistedTable =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if persisted.version != snapshot::SNAPSHOT_VERSION {
            tracing::warn!(
                version = persisted.version,
                "state file has unexpected version, reading what is recognizable"
            );
        }
        Ok(Some(snapshot::from_snapshot(persisted, params)))
    }

    /// Loads persisted state and reconciles it with the seed lists. Never fails:
    /// a missing, unreadable or corrupt state file yields a fresh table from the seeds.
    pub fn load_or_seed(
        path: &Path,
        seeds: &SeedLists,
        policy: StalePolicy,
        params: &ScoringParams,
    ) -> EndpointTable {
        match EndpointTable::load_from_path(path, params) {
            Ok(Some(mut table)) => {
                let report = table.reconcile(seeds, policy);
                tracing::info!(
                    path = %path.display(),
                    endpoints = table.len(),
                    added = report.added,
                    pruned = report.pruned,
                    "loaded endpoint state"
                );
                table
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "no endpoint state yet, seeding");
                EndpointTable::from_seeds(seeds)
            }
            Err(e) => {
                tracing::warn!(error = %e, "endpoint state unusable, reinitializing from seed lists");
                EndpointTable::from_seeds(seeds)
            }
        }
    }
}
