//! Run Manifest - structured identity sidecar for a result directory

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ExperimentKey;
use crate::registry::Mode;
use crate::Result;

/// File name of the manifest inside a run's result directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Run Manifest records which combination produced a result directory.
///
/// Written next to the toolkit's output before the run is launched, so the
/// aggregator can read named fields instead of splitting the directory name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunManifest {
    run_name: String,
    mode: Mode,
    model: String,
    extractor: Option<String>,
    scene: String,
    resolution: u32,
    created_at: DateTime<Utc>,
    command: Option<String>,
}

impl RunManifest {
    /// Create a manifest for an experiment key with the current timestamp.
    #[must_use]
    pub fn new(key: &ExperimentKey, mode: Mode) -> Self {
        Self::builder(key, mode).build()
    }

    /// Create a builder for constructing a manifest with optional fields.
    #[must_use]
    pub fn builder(key: &ExperimentKey, mode: Mode) -> RunManifestBuilder {
        RunManifestBuilder::new(key, mode)
    }

    /// Result directory base name.
    #[must_use]
    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    /// Unmixing regime.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Extractor name, if the run used one.
    #[must_use]
    pub fn extractor(&self) -> Option<&str> {
        self.extractor.as_deref()
    }

    /// Scene theme.
    #[must_use]
    pub fn scene(&self) -> &str {
        &self.scene
    }

    /// Spatial resolution.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Command line that launched the run, if recorded.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Write the manifest into `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Read the manifest from `dir`, or `None` when the directory has none.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// Builder for `RunManifest`.
#[derive(Debug)]
pub struct RunManifestBuilder {
    key: ExperimentKey,
    mode: Mode,
    created_at: DateTime<Utc>,
    command: Option<String>,
}

impl RunManifestBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(key: &ExperimentKey, mode: Mode) -> Self {
        Self {
            key: key.clone(),
            mode,
            created_at: Utc::now(),
            command: None,
        }
    }

    /// Record the launching command line.
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `RunManifest`.
    #[must_use]
    pub fn build(self) -> RunManifest {
        RunManifest {
            run_name: self.key.run_dir_name(),
            mode: self.mode,
            model: self.key.model().to_string(),
            extractor: self.key.extractor().map(str::to_string),
            scene: self.key.theme().to_string(),
            resolution: self.key.resolution(),
            created_at: self.created_at,
            command: self.command,
        }
    }
}
