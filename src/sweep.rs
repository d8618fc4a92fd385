//! Experiment sweep driver
//!
//! Walks resolutions (outer) and themes (inner) in the order given, one
//! blocking toolkit run per combination whose input data exists.
//!
//! | Condition                         | Handling                          |
//! |-----------------------------------|-----------------------------------|
//! | data file absent                  | skipped, logged                   |
//! | unsupported model/extractor       | rejected, logged, sweep continues |
//! | supervised model, no extractors   | fatal in [`SweepDriver::run_model_sweep`] |
//! | toolkit exits non-zero            | fatal, same exit status           |

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::experiment::{ExperimentKey, RunManifest};
use crate::invocation::{Invocation, InvocationBuilder};
use crate::registry::Model;
use crate::runner::CommandRunner;
use crate::{Error, Result};

/// What happened to one combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Command was run (or only logged, for a dry run)
    Launched {
        /// Rendered command line
        command: String,
        /// Whether execution was skipped
        dry_run: bool,
    },
    /// Input data file does not exist
    MissingInput {
        /// Path that was checked
        path: PathBuf,
    },
    /// Model/extractor selection was refused
    Rejected {
        /// Error message
        reason: String,
    },
}

/// One visited combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepEntry {
    /// Combination
    pub key: ExperimentKey,
    /// Result
    pub outcome: Outcome,
}

/// Combinations in the order they were visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    entries: Vec<SweepEntry>,
}

impl SweepReport {
    /// Every visited combination.
    #[must_use]
    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    /// Number of visited combinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was visited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combinations whose command was run or logged.
    pub fn launched(&self) -> impl Iterator<Item = &ExperimentKey> {
        self.keys_where(|o| matches!(o, Outcome::Launched { .. }))
    }

    /// Combinations skipped for missing input.
    pub fn skipped(&self) -> impl Iterator<Item = &ExperimentKey> {
        self.keys_where(|o| matches!(o, Outcome::MissingInput { .. }))
    }

    /// Combinations refused by the registry.
    pub fn rejected(&self) -> impl Iterator<Item = &ExperimentKey> {
        self.keys_where(|o| matches!(o, Outcome::Rejected { .. }))
    }

    /// Append another report.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    fn push(&mut self, key: ExperimentKey, outcome: Outcome) {
        self.entries.push(SweepEntry { key, outcome });
    }

    fn keys_where(&self, pred: fn(&Outcome) -> bool) -> impl Iterator<Item = &ExperimentKey> {
        self.entries
            .iter()
            .filter(move |e| pred(&e.outcome))
            .map(|e| &e.key)
    }
}

/// Drives toolkit runs over parameter combinations.
#[derive(Debug)]
pub struct SweepDriver<R> {
    builder: InvocationBuilder,
    data_dir: PathBuf,
    runner: R,
}

impl<R: CommandRunner> SweepDriver<R> {
    /// Create a driver.
    ///
    /// # Arguments
    ///
    /// * `builder` - Invocation builder
    /// * `data_dir` - Directory holding `{theme}_{resolution}.mat` inputs
    /// * `runner` - Executes non-dry-run invocations
    #[must_use]
    pub fn new(builder: InvocationBuilder, data_dir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            builder,
            data_dir: data_dir.into(),
            runner,
        }
    }

    /// The command runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Input data file for a dataset name.
    #[must_use]
    pub fn data_file(&self, data_name: &str) -> PathBuf {
        self.data_dir.join(format!("{data_name}.mat"))
    }

    /// Sweep one model/extractor pairing over resolutions × themes.
    ///
    /// # Errors
    ///
    /// Returns `ExternalProcess` as soon as a run exits non-zero; run config and
    /// filesystem failures are also fatal. Registry rejections are not errors.
    pub fn run_sweep<S: AsRef<str>>(
        &mut self,
        themes: &[S],
        resolutions: &[u32],
        model: &str,
        extractor: Option<&str>,
        dry_run: bool,
    ) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for &resolution in resolutions {
            for theme in themes {
                let mut key = ExperimentKey::new(theme.as_ref(), resolution, model);
                if let Some(extractor) = extractor {
                    key = key.with_extractor(extractor);
                }
                let data_name = key.data_name();

                let data_file = self.data_file(&data_name);
                if !data_file.is_file() {
                    warn!(data = %data_file.display(), "data file not found, skipping");
                    report.push(key, Outcome::MissingInput { path: data_file });
                    continue;
                }

                match self.builder.build_invocation(&data_name, model, extractor) {
                    Ok(invocation) => {
                        let outcome = self.launch(&key, &invocation, dry_run)?;
                        report.push(key, outcome);
                    }
                    Err(e) if e.is_configuration() => {
                        error!(run = %key, "{e}");
                        report.push(
                            key,
                            Outcome::Rejected {
                                reason: e.to_string(),
                            },
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(report)
    }

    /// Sweep every model; supervised models once per extractor, blind models once.
    ///
    /// Names outside the registry are swept without an extractor so each
    /// combination is rejected and logged individually.
    ///
    /// # Errors
    ///
    /// Returns `NoExtractors` when a supervised model is reached with an empty
    /// extractor list, plus everything [`Self::run_sweep`] returns
    pub fn run_model_sweep<S: AsRef<str>>(
        &mut self,
        themes: &[S],
        resolutions: &[u32],
        models: &[S],
        extractors: &[S],
        dry_run: bool,
    ) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for model in models {
            let model = model.as_ref();
            let supervised = model
                .parse::<Model>()
                .is_ok_and(Model::requires_extractor);

            if supervised {
                if extractors.is_empty() {
                    return Err(Error::NoExtractors {
                        model: model.to_string(),
                    });
                }
                for extractor in extractors {
                    report.extend(self.run_sweep(
                        themes,
                        resolutions,
                        model,
                        Some(extractor.as_ref()),
                        dry_run,
                    )?);
                }
            } else {
                report.extend(self.run_sweep(themes, resolutions, model, None, dry_run)?);
            }
        }

        Ok(report)
    }

    fn launch(
        &mut self,
        key: &ExperimentKey,
        invocation: &Invocation,
        dry_run: bool,
    ) -> Result<Outcome> {
        let command = invocation.command_line();

        if dry_run {
            info!(run = %key, "dry run: {command}");
            return Ok(Outcome::Launched {
                command,
                dry_run: true,
            });
        }

        write_manifest(key, invocation, &command)?;
        info!(run = %key, "running: {command}");
        let code = self.runner.run(invocation)?;
        if code != 0 {
            error!(run = %key, code, "toolkit exited with non-zero status");
            return Err(Error::ExternalProcess { command, code });
        }

        Ok(Outcome::Launched {
            command,
            dry_run: false,
        })
    }
}

fn write_manifest(key: &ExperimentKey, invocation: &Invocation, command: &str) -> Result<PathBuf> {
    let dir: &Path = invocation.result_dir();
    RunManifest::builder(key, invocation.mode())
        .command(command)
        .build()
        .write(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_partitions() {
        let mut report = SweepReport::default();
        report.push(
            ExperimentKey::new("A", 4, "FCLS"),
            Outcome::MissingInput {
                path: PathBuf::from("data/A_4.mat"),
            },
        );
        report.push(
            ExperimentKey::new("B", 4, "FCLS"),
            Outcome::Rejected {
                reason: "x".to_string(),
            },
        );

        assert_eq!(report.len(), 2);
        assert_eq!(report.skipped().count(), 1);
        assert_eq!(report.rejected().count(), 1);
        assert_eq!(report.launched().count(), 0);
    }
}
