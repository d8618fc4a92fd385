//! Run invocation builder
//!
//! Validates a (data, model, extractor) selection against the registry, points
//! the toolkit's run config at the combination's result directory and renders
//! the command line:
//!
//! ```text
//! python unmixing.py mode={mode} data={data} model={model}[ extractor={extractor}]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{RunConfig, SweepConfig, ToolkitConfig, AUTO_LOG_ID};
use crate::experiment::{combination_name, result_dir};
use crate::registry::{Extractor, Mode, Model};
use crate::{Error, Result};

/// A fully resolved toolkit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    mode: Mode,
    combination_name: String,
    data_name: String,
    model: Model,
    extractor: Option<Extractor>,
    result_dir: PathBuf,
    program: String,
    args: Vec<String>,
}

impl Invocation {
    /// Unmixing regime.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// `{extractor}_{model}` or `{model}`.
    #[must_use]
    pub fn combination_name(&self) -> &str {
        &self.combination_name
    }

    /// `{theme}_{resolution}`.
    #[must_use]
    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    /// Validated model.
    #[must_use]
    pub const fn model(&self) -> Model {
        self.model
    }

    /// Validated extractor, if any.
    #[must_use]
    pub const fn extractor(&self) -> Option<Extractor> {
        self.extractor
    }

    /// Directory the toolkit will log into.
    #[must_use]
    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    /// Executable.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments after the executable.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Space-joined command line.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Builds [`Invocation`]s and keeps the toolkit's run config in step.
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    toolkit: ToolkitConfig,
    run_config: PathBuf,
    result_root: PathBuf,
}

impl InvocationBuilder {
    /// Create a builder.
    ///
    /// # Arguments
    ///
    /// * `toolkit` - Interpreter and script to launch
    /// * `run_config` - Toolkit YAML config rewritten before every run
    /// * `result_root` - Root of the `{mode}/{combination}_{data}/` tree
    #[must_use]
    pub fn new(
        toolkit: ToolkitConfig,
        run_config: impl Into<PathBuf>,
        result_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            toolkit,
            run_config: run_config.into(),
            result_root: result_root.into(),
        }
    }

    /// Builder using the paths and toolkit of a sweep config.
    #[must_use]
    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(
            config.toolkit.clone(),
            &config.paths.run_config,
            &config.paths.result_root,
        )
    }

    /// Validate a selection, update the run config and render the command.
    ///
    /// Blind models accept an extractor; it then becomes part of the
    /// combination name and the command.
    ///
    /// # Errors
    ///
    /// - `UnsupportedModel` / `UnsupportedExtractor` for names outside the registry
    /// - `MissingExtractor` for a supervised model without extractor
    /// - `Config` / `Io` / `Yaml` if the run config cannot be read or rewritten
    pub fn build_invocation(
        &self,
        data_name: &str,
        model_name: &str,
        extractor_name: Option<&str>,
    ) -> Result<Invocation> {
        let model: Model = model_name.parse()?;
        let extractor = extractor_name.map(str::parse::<Extractor>).transpose()?;
        if model.requires_extractor() && extractor.is_none() {
            return Err(Error::MissingExtractor {
                model: model.name().to_string(),
            });
        }

        let mode = model.mode();
        let combination = combination_name(model.name(), extractor.map(Extractor::name));
        let result_dir = result_dir(&self.result_root, mode, &combination, data_name);

        let parent_log_dir = format!("{}/", result_dir.display());
        let mut run_config = RunConfig::load(&self.run_config)?;
        run_config.set_logger(&parent_log_dir, AUTO_LOG_ID)?;
        run_config.save()?;
        debug!(
            config = %self.run_config.display(),
            parent_log_dir = %parent_log_dir,
            "run config updated"
        );

        let mut args = vec![
            self.toolkit.script.clone(),
            format!("mode={mode}"),
            format!("data={data_name}"),
            format!("model={model}"),
        ];
        if let Some(extractor) = extractor {
            args.push(format!("extractor={extractor}"));
        }

        Ok(Invocation {
            mode,
            combination_name: combination,
            data_name: data_name.to_string(),
            model,
            extractor,
            result_dir,
            program: self.toolkit.interpreter.clone(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(dir: &Path) -> InvocationBuilder {
        let config = dir.join("mlxp.yaml");
        std::fs::write(&config, "logger:\n  parent_log_dir: ./logs/\n  forced_log_id: 3\n").unwrap();
        InvocationBuilder::new(ToolkitConfig::default(), config, "experiments")
    }

    #[test]
    fn test_supervised_command_order() {
        let dir = tempfile::tempdir().unwrap();
        let inv = builder(dir.path())
            .build_invocation("A_4", "FCLS", Some("VCA"))
            .unwrap();
        assert_eq!(
            inv.command_line(),
            "python unmixing.py mode=supervised data=A_4 model=FCLS extractor=VCA"
        );
        assert_eq!(inv.combination_name(), "VCA_FCLS");
    }

    #[test]
    fn test_blind_command_has_no_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let inv = builder(dir.path())
            .build_invocation("A_4", "MiSiCNet", None)
            .unwrap();
        assert_eq!(
            inv.command_line(),
            "python unmixing.py mode=blind data=A_4 model=MiSiCNet"
        );
        assert_eq!(inv.result_dir(), Path::new("experiments/blind/MiSiCNet_A_4"));
    }

    #[test]
    fn test_unknown_model_leaves_config_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let b = builder(dir.path());
        let before = std::fs::read_to_string(dir.path().join("mlxp.yaml")).unwrap();

        let err = b.build_invocation("A_4", "KMeans", Some("VCA")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedModel(ref m) if m == "KMeans"));

        let after = std::fs::read_to_string(dir.path().join("mlxp.yaml")).unwrap();
        assert_eq!(before, after);
    }
}
