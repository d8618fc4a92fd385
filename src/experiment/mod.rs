//! Experiment identity and results
//!
//! ## Overview
//!
//! ```text
//! ExperimentKey ──> result dir {root}/{mode}/{combination}_{data}/
//!                      ├── manifest.json      (RunManifest)
//!                      └── 1/metrics/SAD.json ──> ResultRecord ──< ResultStore
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use unmix_sweep::experiment::ExperimentKey;
//!
//! let key = ExperimentKey::new("FDS1", 4, "FCLS").with_extractor("VCA");
//! assert_eq!(key.data_name(), "FDS1_4");
//! assert_eq!(key.combination_name(), "VCA_FCLS");
//! ```

mod key;
mod manifest;
mod record;
mod store;

pub use key::{combination_name, data_name, result_dir, ExperimentKey};
pub use manifest::{RunManifest, RunManifestBuilder, MANIFEST_FILE};
pub use record::{
    ResultRecord, RunIdentity, EXTRACTOR_NAME, RESOLUTION, RUN_NAME, SCENE_NAME, UNMIXER_NAME,
};
pub use store::{collect_results, metrics_path, ResultStore, RUN_INDEX};
