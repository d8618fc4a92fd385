//! Experiment Key - identity of one sweep combination

use std::fmt;
use std::path::{Path, PathBuf};

use crate::registry::Mode;

/// Name of the input dataset for a scene theme at a resolution (`{theme}_{resolution}`).
#[must_use]
pub fn data_name(theme: &str, resolution: u32) -> String {
    format!("{theme}_{resolution}")
}

/// Name of a model/extractor pairing (`{extractor}_{model}`, or just `{model}`).
#[must_use]
pub fn combination_name(model: &str, extractor: Option<&str>) -> String {
    match extractor {
        Some(extractor) => format!("{extractor}_{model}"),
        None => model.to_string(),
    }
}

/// Directory the toolkit logs a run into: `{result_root}/{mode}/{combination}_{data}/`.
#[must_use]
pub fn result_dir(result_root: &Path, mode: Mode, combination: &str, data: &str) -> PathBuf {
    result_root
        .join(mode.as_str())
        .join(format!("{combination}_{data}"))
}

/// One point of the sweep: (theme, resolution, model, extractor).
///
/// Model and extractor are kept as raw names; validation against the registry
/// happens when the invocation is built, so that a bad name is reported for the
/// combination that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExperimentKey {
    theme: String,
    resolution: u32,
    model: String,
    extractor: Option<String>,
}

impl ExperimentKey {
    /// Create a key without an extractor.
    #[must_use]
    pub fn new(theme: impl Into<String>, resolution: u32, model: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            resolution,
            model: model.into(),
            extractor: None,
        }
    }

    /// Attach an extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl Into<String>) -> Self {
        self.extractor = Some(extractor.into());
        self
    }

    /// Scene theme.
    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Spatial resolution.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Extractor name, if any.
    #[must_use]
    pub fn extractor(&self) -> Option<&str> {
        self.extractor.as_deref()
    }

    /// `{theme}_{resolution}`
    #[must_use]
    pub fn data_name(&self) -> String {
        data_name(&self.theme, self.resolution)
    }

    /// `{extractor}_{model}` or `{model}`
    #[must_use]
    pub fn combination_name(&self) -> String {
        combination_name(&self.model, self.extractor())
    }

    /// `{combination}_{data}`, the result directory's base name.
    #[must_use]
    pub fn run_dir_name(&self) -> String {
        format!("{}_{}", self.combination_name(), self.data_name())
    }

    /// Result directory of this combination under `result_root`.
    #[must_use]
    pub fn result_dir(&self, result_root: &Path, mode: Mode) -> PathBuf {
        result_dir(result_root, mode, &self.combination_name(), &self.data_name())
    }
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.run_dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names_with_extractor() {
        let key = ExperimentKey::new("FDS1", 4, "FCLS").with_extractor("VCA");
        assert_eq!(key.data_name(), "FDS1_4");
        assert_eq!(key.combination_name(), "VCA_FCLS");
        assert_eq!(key.run_dir_name(), "VCA_FCLS_FDS1_4");
    }

    #[test]
    fn test_derived_names_without_extractor() {
        let key = ExperimentKey::new("FDS1", 8, "MSNet");
        assert_eq!(key.combination_name(), "MSNet");
        assert_eq!(key.to_string(), "MSNet_FDS1_8");
    }

    #[test]
    fn test_result_dir_layout() {
        let dir = result_dir(Path::new("experiments"), Mode::Blind, "MSNet", "A_4");
        assert_eq!(dir, Path::new("experiments/blind/MSNet_A_4"));

        let key = ExperimentKey::new("A", 4, "FCLS").with_extractor("VCA");
        assert_eq!(
            key.result_dir(Path::new("experiments"), Mode::Supervised),
            Path::new("experiments/supervised/VCA_FCLS_A_4")
        );
    }
}
