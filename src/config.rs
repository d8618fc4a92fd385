//! # Configuration
//!
//! Two YAML documents are involved in a sweep:
//!
//! - [`RunConfig`]: the external toolkit's own config (`./config/mlxp.yaml`).
//!   Only `logger.parent_log_dir` and `logger.forced_log_id` are touched; every
//!   other key round-trips unchanged.
//! - [`SweepConfig`]: this tool's settings. Loaded from the first file found:
//!   1. Path given on the command line
//!   2. `UNMIX_SWEEP_CONFIG` environment variable
//!   3. `./unmix-sweep.yaml`
//!
//!   Missing fields fall back to defaults.
//!
//! ## Example Sweep Configuration
//!
//! ```yaml
//! paths:
//!   data_dir: ./data
//!   result_root: ./experiments
//! toolkit:
//!   interpreter: python
//!   script: unmixing.py
//! sweep:
//!   themes: [FDS1, FDS2]
//!   resolutions: [4, 8]
//!   models: [FCLS, MSNet]
//!   extractors: [VCA]
//! logging:
//!   level: info
//! ```

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::logging::LogConfig;
use crate::{Error, Result};

/// `forced_log_id` sentinel meaning "let the toolkit assign the run index".
pub const AUTO_LOG_ID: i64 = -1;

/// Environment variable naming the sweep config file.
pub const CONFIG_ENV: &str = "UNMIX_SWEEP_CONFIG";

/// Default sweep config file name in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "unmix-sweep.yaml";

const LOGGER: &str = "logger";
const PARENT_LOG_DIR: &str = "parent_log_dir";
const FORCED_LOG_ID: &str = "forced_log_id";

/// The toolkit's run configuration, kept as an untyped YAML document.
#[derive(Debug, Clone)]
pub struct RunConfig {
    path: PathBuf,
    document: Value,
}

impl RunConfig {
    /// Read the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not YAML, or its root is
    /// not a mapping
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::parse(path, &content)
    }

    /// Parse a document that will be saved back to `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not YAML or its root is not a mapping
    pub fn parse(path: impl Into<PathBuf>, yaml: &str) -> Result<Self> {
        let path = path.into();
        let document = match serde_yaml::from_str::<Value>(yaml)? {
            Value::Null => Value::Mapping(Mapping::new()),
            doc @ Value::Mapping(_) => doc,
            _ => {
                return Err(Error::Config(format!(
                    "{}: root of the run config must be a mapping",
                    path.display()
                )))
            }
        };
        Ok(Self { path, document })
    }

    /// File this config is saved to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole document.
    #[must_use]
    pub const fn document(&self) -> &Value {
        &self.document
    }

    /// Current `logger.parent_log_dir`.
    #[must_use]
    pub fn parent_log_dir(&self) -> Option<&str> {
        self.document
            .get(LOGGER)
            .and_then(|l| l.get(PARENT_LOG_DIR))
            .and_then(Value::as_str)
    }

    /// Current `logger.forced_log_id`.
    #[must_use]
    pub fn forced_log_id(&self) -> Option<i64> {
        self.document
            .get(LOGGER)
            .and_then(|l| l.get(FORCED_LOG_ID))
            .and_then(Value::as_i64)
    }

    /// Point the toolkit's logger at `parent_log_dir` with the given run index.
    ///
    /// A missing `logger` section is created.
    ///
    /// # Errors
    ///
    /// Returns error if `logger` exists but is not a mapping
    pub fn set_logger(&mut self, parent_log_dir: &str, forced_log_id: i64) -> Result<()> {
        let Some(root) = self.document.as_mapping_mut() else {
            return Err(Error::Config("run config root is not a mapping".to_string()));
        };

        let logger = root
            .entry(Value::String(LOGGER.to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        let Some(logger) = logger.as_mapping_mut() else {
            return Err(Error::Config(format!(
                "{}: '{LOGGER}' must be a mapping",
                self.path.display()
            )));
        };

        logger.insert(
            Value::String(PARENT_LOG_DIR.to_string()),
            Value::String(parent_log_dir.to_string()),
        );
        logger.insert(
            Value::String(FORCED_LOG_ID.to_string()),
            Value::Number(forced_log_id.into()),
        );
        Ok(())
    }

    /// Overwrite the file with the current document.
    ///
    /// The text goes to a temporary file in the same directory which is then
    /// renamed over the original, so a concurrent reader never sees a partial
    /// file. Concurrent writers still race: the last rename wins. The file keeps
    /// its permissions, and a symlinked config is written through to its target.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or any filesystem step fails
    pub fn save(&self) -> Result<()> {
        let text = serde_yaml::to_string(&self.document)?;

        // Write through symlinks to the real file
        let (target, permissions) = match fs::canonicalize(&self.path) {
            Ok(target) => {
                let permissions = fs::metadata(&target)?.permissions();
                (target, Some(permissions))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => (self.path.clone(), None),
            Err(e) => return Err(e.into()),
        };
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(text.as_bytes())?;
        if let Some(permissions) = permissions {
            tmp.as_file().set_permissions(permissions)?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

/// Filesystem layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `{theme}_{resolution}.mat` inputs
    pub data_dir: PathBuf,
    /// Toolkit run configuration file
    pub run_config: PathBuf,
    /// Root of `{mode}/{combination}_{data}/` result directories
    pub result_root: PathBuf,
    /// Root of `{run}/artifacts/Estimate/estimates.mat` run logs
    pub log_root: PathBuf,
    /// Where rendered plots are written
    pub plot_dir: PathBuf,
    /// TrueType font for figure text; system fonts are searched when unset
    pub font: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            run_config: PathBuf::from("./config/mlxp.yaml"),
            result_root: PathBuf::from("./experiments"),
            log_root: PathBuf::from("./logs"),
            plot_dir: PathBuf::from("./plots"),
            font: None,
        }
    }
}

/// How the external toolkit is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Interpreter executable
    pub interpreter: String,
    /// Entry script passed to the interpreter
    pub script: String,
    /// Working directory of the child process
    pub workdir: PathBuf,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            interpreter: "python".to_string(),
            script: "unmixing.py".to_string(),
            workdir: PathBuf::from("."),
        }
    }
}

/// Parameter lists to sweep over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPlan {
    /// Scene themes
    pub themes: Vec<String>,
    /// Spatial resolutions
    pub resolutions: Vec<u32>,
    /// Model names
    pub models: Vec<String>,
    /// Extractor names (used by supervised models only)
    pub extractors: Vec<String>,
    /// Log commands instead of running them
    pub dry_run: bool,
}

/// Settings of this tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Filesystem layout
    pub paths: PathsConfig,
    /// External toolkit
    pub toolkit: ToolkitConfig,
    /// Sweep parameters
    pub sweep: SweepPlan,
    /// Logging
    pub logging: LogConfig,
}

impl SweepConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `UNMIX_SWEEP_CONFIG` and then
    /// `./unmix-sweep.yaml` are tried, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the chosen file cannot be read or parsed
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(local);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid sweep configuration
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_sweep_config_defaults() {
        let config = SweepConfig::default();
        assert_eq!(config.paths.data_dir, PathBuf::from("./data"));
        assert_eq!(config.paths.run_config, PathBuf::from("./config/mlxp.yaml"));
        assert_eq!(config.toolkit.interpreter, "python");
        assert_eq!(config.toolkit.script, "unmixing.py");
        assert!(!config.sweep.dry_run);
    }

    #[test]
    fn test_sweep_config_partial_yaml() {
        let yaml = "sweep:\n  themes: [FDS1]\n  resolutions: [4, 8]\nlogging:\n  level: debug\n";
        let config = SweepConfig::parse(yaml).unwrap();
        assert_eq!(config.sweep.themes, vec!["FDS1"]);
        assert_eq!(config.sweep.resolutions, vec![4, 8]);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.toolkit, ToolkitConfig::default());
    }

    #[test]
    fn test_sweep_config_empty_is_default() {
        assert_eq!(SweepConfig::parse("").unwrap(), SweepConfig::default());
    }

    #[test]
    fn test_run_config_creates_logger() {
        let mut config = RunConfig::parse("mlxp.yaml", "seed: 1\n").unwrap();
        config.set_logger("out/", AUTO_LOG_ID).unwrap();
        assert_eq!(config.parent_log_dir(), Some("out/"));
        assert_eq!(config.forced_log_id(), Some(-1));
    }

    #[test]
    fn test_run_config_rejects_scalar_logger() {
        let mut config = RunConfig::parse("mlxp.yaml", "logger: 3\n").unwrap();
        assert!(matches!(
            config.set_logger("out/", AUTO_LOG_ID),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_run_config_rejects_sequence_root() {
        assert!(RunConfig::parse("mlxp.yaml", "- a\n- b\n").is_err());
    }

    #[test]
    fn test_run_config_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mlxp.yaml");
        fs::write(&path, "seed: 1\n").unwrap();

        let mut config = RunConfig::load(&path).unwrap();
        config.set_logger("out/", AUTO_LOG_ID).unwrap();
        config.save().unwrap();

        let reloaded = RunConfig::load(&path).unwrap();
        assert_eq!(reloaded.parent_log_dir(), Some("out/"));
        assert_eq!(reloaded.document()["seed"], Value::from(1));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_config_save_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mlxp.yaml");
        fs::write(&path, "seed: 1\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let mut config = RunConfig::load(&path).unwrap();
        config.set_logger("out/", AUTO_LOG_ID).unwrap();
        config.save().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_config_save_writes_through_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.yaml");
        let link = dir.path().join("mlxp.yaml");
        fs::write(&real, "seed: 1\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut config = RunConfig::load(&link).unwrap();
        config.set_logger("out/", AUTO_LOG_ID).unwrap();
        config.save().unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        let updated = RunConfig::load(&real).unwrap();
        assert_eq!(updated.parent_log_dir(), Some("out/"));
    }
}
