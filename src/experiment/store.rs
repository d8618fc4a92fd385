//! Result Store - in-memory collection of finished runs
//!
//! Walks a directory of result folders laid out by the toolkit:
//!
//! ```text
//! <root>/
//!   VCA_FCLS_FDS1_4/
//!     manifest.json          (optional, written by this tool)
//!     1/metrics/SAD.json     (flat metric name -> number mapping)
//!   MSNet_FDS1_4/
//!     1/metrics/SAD.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use super::{ResultRecord, RunIdentity, RunManifest};
use crate::query::{self, Predicate};
use crate::Result;

/// Run index the toolkit assigns when `forced_log_id` is `-1` on a fresh directory.
///
/// Only this index is ever read; retries logged under other indices are ignored.
pub const RUN_INDEX: &str = "1";

/// Path of the SAD metrics file beneath a result directory.
#[must_use]
pub fn metrics_path(run_dir: &Path) -> PathBuf {
    run_dir.join(RUN_INDEX).join("metrics").join("SAD.json")
}

/// Collect one record per immediate subdirectory of `root` that has a metrics file.
///
/// Subdirectories are visited in name order. Directories without metrics are
/// skipped silently; directories whose identity cannot be determined are
/// skipped with a warning.
///
/// # Errors
///
/// Returns error if `root` cannot be listed or a present metrics/manifest file
/// cannot be read or parsed
pub fn collect_results(root: &Path) -> Result<Vec<ResultRecord>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut records = Vec::new();
    for dir in dirs {
        let Some(name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let metrics = metrics_path(&dir);
        if !metrics.is_file() {
            debug!(run = %name, "no metrics file, skipping");
            continue;
        }

        let identity = match RunManifest::read(&dir)? {
            Some(manifest) => RunIdentity::from_manifest(&manifest, name.as_str()),
            None => {
                let Some(identity) = RunIdentity::parse_dir_name(&name) else {
                    warn!(run = %name, "cannot parse run identity from directory name, skipping");
                    continue;
                };
                identity
            }
        };

        records.push(ResultRecord::from_metrics_file(&metrics)?.with_identity(&identity));
    }

    Ok(records)
}

/// In-memory store of result records.
#[derive(Debug, Default)]
pub struct ResultStore {
    records: Vec<ResultRecord>,
}

impl ResultStore {
    /// Create a new empty result store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every finished run beneath `root` (see [`collect_results`]).
    ///
    /// # Errors
    ///
    /// Returns error if the directory walk or a file load fails
    pub fn collect(root: &Path) -> Result<Self> {
        Ok(Self {
            records: collect_results(root)?,
        })
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the number of records in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Add a record to the store.
    pub fn add(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    /// All records, in collection order.
    #[must_use]
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// Records matching a predicate.
    #[must_use]
    pub fn filter(&self, predicate: &Predicate) -> Vec<&ResultRecord> {
        self.records.iter().filter(|r| predicate.matches(r)).collect()
    }

    /// Records whose `keys[i]` equals `values[i]` for every `i`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `keys` and `values` differ in length
    pub fn filter_by<K: AsRef<str>>(
        &self,
        keys: &[K],
        values: &[Value],
    ) -> Result<Vec<&ResultRecord>> {
        query::filter_by(&self.records, keys, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_default() {
        let store = ResultStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_metrics_path() {
        let path = metrics_path(Path::new("runs/VCA_FCLS_A_4"));
        assert_eq!(path, Path::new("runs/VCA_FCLS_A_4/1/metrics/SAD.json"));
    }

    #[test]
    fn test_collect_skips_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let records = collect_results(dir.path()).unwrap();
        assert!(records.is_empty());
    }
}
