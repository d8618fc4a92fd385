//! Child process execution

use std::path::PathBuf;
use std::process::Command;

use crate::invocation::Invocation;
use crate::Result;

/// Runs an invocation to completion.
pub trait CommandRunner {
    /// Block until the command exits and return its exit status.
    ///
    /// # Errors
    ///
    /// Returns error if the command cannot be started
    fn run(&mut self, invocation: &Invocation) -> Result<i32>;
}

/// Launches the toolkit as a blocking child process.
///
/// There is no timeout: a hung toolkit blocks the sweep.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    workdir: PathBuf,
}

impl ProcessRunner {
    /// Runner whose children start in `workdir`.
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(".")
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<i32> {
        let status = Command::new(invocation.program())
            .args(invocation.args())
            .current_dir(&self.workdir)
            .status()?;
        // Terminated by a signal: no code to forward
        Ok(status.code().unwrap_or(1))
    }
}
