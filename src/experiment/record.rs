//! Result Record - metrics of one finished run plus its identity

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RunManifest;
use crate::{Error, Result};

/// Record key holding the extractor name (`null` for blind runs).
pub const EXTRACTOR_NAME: &str = "extractor_name";
/// Record key holding the model name.
pub const UNMIXER_NAME: &str = "unmixer_name";
/// Record key holding the scene theme.
pub const SCENE_NAME: &str = "scene_name";
/// Record key holding the resolution (as a string).
pub const RESOLUTION: &str = "resolution";
/// Record key holding the raw result directory name.
pub const RUN_NAME: &str = "run_name";

/// Who produced a result directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    extractor: Option<String>,
    model: String,
    scene: String,
    resolution: String,
    run_name: String,
}

impl RunIdentity {
    /// Parse a result directory name positionally.
    ///
    /// Segments are read right to left: resolution, scene, model, extractor.
    /// A three-segment name has no extractor. Scene names containing `_` shift
    /// every field and parse silently wrong; runs written by this tool carry a
    /// [`RunManifest`] instead.
    #[must_use]
    pub fn parse_dir_name(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('_').collect();
        let n = parts.len();
        if n < 3 {
            return None;
        }

        Some(Self {
            extractor: (n >= 4).then(|| parts[n - 4].to_string()),
            model: parts[n - 3].to_string(),
            scene: parts[n - 2].to_string(),
            resolution: parts[n - 1].to_string(),
            run_name: name.to_string(),
        })
    }

    /// Identity from a manifest; `run_name` is the directory actually scanned.
    #[must_use]
    pub fn from_manifest(manifest: &RunManifest, run_name: impl Into<String>) -> Self {
        Self {
            extractor: manifest.extractor().map(str::to_string),
            model: manifest.model().to_string(),
            scene: manifest.scene().to_string(),
            resolution: manifest.resolution().to_string(),
            run_name: run_name.into(),
        }
    }

    /// Extractor name, if any.
    #[must_use]
    pub fn extractor(&self) -> Option<&str> {
        self.extractor.as_deref()
    }

    /// Model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Scene theme.
    #[must_use]
    pub fn scene(&self) -> &str {
        &self.scene
    }

    /// Resolution as written in the directory name.
    #[must_use]
    pub fn resolution(&self) -> &str {
        &self.resolution
    }

    /// Raw directory name.
    #[must_use]
    pub fn run_name(&self) -> &str {
        &self.run_name
    }
}

/// Flat mapping of metric names to values, annotated with the run identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord {
    fields: Map<String, Value>,
}

impl ResultRecord {
    /// Wrap a metrics mapping.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Load a metrics JSON file; it must hold a single object.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not JSON, or is not an object
    pub fn from_metrics_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        match serde_json::from_str(&content)? {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(Error::InvalidInput(format!(
                "{}: expected a JSON object of metrics, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    /// Merge identity fields in, overwriting metrics of the same name.
    #[must_use]
    pub fn with_identity(mut self, identity: &RunIdentity) -> Self {
        let extractor = identity
            .extractor()
            .map_or(Value::Null, |e| Value::String(e.to_string()));
        self.fields.insert(EXTRACTOR_NAME.to_string(), extractor);
        self.fields
            .insert(UNMIXER_NAME.to_string(), identity.model().into());
        self.fields
            .insert(SCENE_NAME.to_string(), identity.scene().into());
        self.fields
            .insert(RESOLUTION.to_string(), identity.resolution().into());
        self.fields
            .insert(RUN_NAME.to_string(), identity.run_name().into());
        self
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Raw directory name, if the record was annotated.
    #[must_use]
    pub fn run_name(&self) -> Option<&str> {
        self.get(RUN_NAME).and_then(Value::as_str)
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_four_segments() {
        let id = RunIdentity::parse_dir_name("VCA_FCLS_FDS1_4").unwrap();
        assert_eq!(id.extractor(), Some("VCA"));
        assert_eq!(id.model(), "FCLS");
        assert_eq!(id.scene(), "FDS1");
        assert_eq!(id.resolution(), "4");
    }

    #[test]
    fn test_parse_reads_from_the_right() {
        // Extra leading segments are ignored
        let id = RunIdentity::parse_dir_name("old_VCA_FCLS_FDS1_4").unwrap();
        assert_eq!(id.extractor(), Some("VCA"));
        assert_eq!(id.run_name(), "old_VCA_FCLS_FDS1_4");
    }

    #[test]
    fn test_parse_blind_run() {
        let id = RunIdentity::parse_dir_name("MSNet_FDS1_4").unwrap();
        assert_eq!(id.extractor(), None);
        assert_eq!(id.model(), "MSNet");
    }

    #[test]
    fn test_parse_too_short() {
        assert!(RunIdentity::parse_dir_name("FDS1_4").is_none());
        assert!(RunIdentity::parse_dir_name("scratch").is_none());
    }

    #[test]
    fn test_identity_overrides_metric_names() {
        let metrics = json!({"sad": 0.1, "run_name": "stale"});
        let Value::Object(fields) = metrics else {
            unreachable!()
        };
        let id = RunIdentity::parse_dir_name("MSNet_A_2").unwrap();
        let record = ResultRecord::new(fields).with_identity(&id);

        assert_eq!(record.run_name(), Some("MSNet_A_2"));
        assert_eq!(record.get(EXTRACTOR_NAME), Some(&Value::Null));
    }

    #[test]
    fn test_metrics_file_must_be_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SAD.json");
        std::fs::write(&path, "[0.1, 0.2]").unwrap();

        let err = ResultRecord::from_metrics_file(&path).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }
}
