//! Sweep driver tests
//!
//! Iteration order, input checks, dry runs and the fatal/recoverable split,
//! with a recording runner standing in for the toolkit.

use std::path::{Path, PathBuf};

use unmix_sweep::config::{RunConfig, ToolkitConfig};
use unmix_sweep::experiment::RunManifest;
use unmix_sweep::invocation::{Invocation, InvocationBuilder};
use unmix_sweep::runner::CommandRunner;
use unmix_sweep::sweep::{Outcome, SweepDriver};
use unmix_sweep::{Error, Result};

/// Records every command and answers with a fixed exit status.
#[derive(Debug, Default)]
struct RecordingRunner {
    commands: Vec<String>,
    result_dirs: Vec<PathBuf>,
    exit_code: i32,
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<i32> {
        self.commands.push(invocation.command_line());
        self.result_dirs.push(invocation.result_dir().to_path_buf());
        Ok(self.exit_code)
    }
}

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new(data_files: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        for name in data_files {
            std::fs::write(dir.path().join("data").join(format!("{name}.mat")), b"").unwrap();
        }
        std::fs::write(
            dir.path().join("mlxp.yaml"),
            "seed: 42\ntrainer:\n  epochs: 100\nlogger:\n  parent_log_dir: ./logs/\n  forced_log_id: 7\n",
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn driver(&self, exit_code: i32) -> SweepDriver<RecordingRunner> {
        self.driver_with(ToolkitConfig::default(), exit_code)
    }

    fn driver_with(&self, toolkit: ToolkitConfig, exit_code: i32) -> SweepDriver<RecordingRunner> {
        let builder = InvocationBuilder::new(
            toolkit,
            self.path().join("mlxp.yaml"),
            self.path().join("experiments"),
        );
        SweepDriver::new(
            builder,
            self.path().join("data"),
            RecordingRunner {
                exit_code,
                ..RecordingRunner::default()
            },
        )
    }
}

// ============================================================================
// Iteration order
// ============================================================================

#[test]
fn test_sweep_runs_themes_inside_resolutions() {
    let ws = Workspace::new(&["A_4", "B_4", "A_8", "B_8"]);
    let mut driver = ws.driver(0);

    let report = driver
        .run_sweep(&["A", "B"], &[4, 8], "FCLS", Some("VCA"), false)
        .unwrap();

    let data: Vec<_> = report.launched().map(|k| k.data_name()).collect();
    assert_eq!(data, vec!["A_4", "B_4", "A_8", "B_8"]);
    assert_eq!(
        driver.runner().commands[0],
        "python unmixing.py mode=supervised data=A_4 model=FCLS extractor=VCA"
    );
    assert_eq!(
        driver.runner().commands[1],
        "python unmixing.py mode=supervised data=B_4 model=FCLS extractor=VCA"
    );
}

#[test]
fn test_two_themes_one_resolution_two_invocations() {
    let ws = Workspace::new(&["A_4", "B_4"]);
    let mut driver = ws.driver(0);

    driver
        .run_sweep(&["A", "B"], &[4], "FCLS", Some("VCA"), false)
        .unwrap();

    let runner = driver.runner();
    assert_eq!(runner.commands.len(), 2);
    assert_eq!(
        runner.result_dirs,
        vec![
            ws.path().join("experiments/supervised/VCA_FCLS_A_4"),
            ws.path().join("experiments/supervised/VCA_FCLS_B_4"),
        ]
    );

    // The run config is left pointing at the last combination
    let config = RunConfig::load(ws.path().join("mlxp.yaml")).unwrap();
    assert_eq!(
        config.parent_log_dir().unwrap(),
        format!("{}/", runner.result_dirs[1].display())
    );
    assert_eq!(config.forced_log_id(), Some(-1));
}

#[test]
fn test_model_sweep_expands_supervised_models_per_extractor() {
    let ws = Workspace::new(&["A_4"]);
    let mut driver = ws.driver(0);

    let report = driver
        .run_model_sweep(&["A"], &[4], &["FCLS", "MSNet"], &["VCA", "SISAL"], true)
        .unwrap();

    let combinations: Vec<_> = report.launched().map(|k| k.combination_name()).collect();
    assert_eq!(combinations, vec!["VCA_FCLS", "SISAL_FCLS", "MSNet"]);
}

// ============================================================================
// Skips and rejections
// ============================================================================

#[test]
fn test_missing_data_file_is_skipped() {
    let ws = Workspace::new(&["B_4"]);
    let mut driver = ws.driver(0);

    let report = driver
        .run_sweep(&["A", "B"], &[4], "MSNet", None, false)
        .unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report.skipped().count(), 1);
    assert!(matches!(
        &report.entries()[0].outcome,
        Outcome::MissingInput { path } if path.ends_with("A_4.mat")
    ));
    assert_eq!(driver.runner().commands.len(), 1);
}

#[test]
fn test_unknown_extractor_is_rejected_and_sweep_continues() {
    let ws = Workspace::new(&["A_4", "B_4"]);
    let mut driver = ws.driver(0);

    let report = driver
        .run_sweep(&["A", "B"], &[4], "FCLS", Some("X"), false)
        .unwrap();

    assert_eq!(report.rejected().count(), 2);
    assert!(driver.runner().commands.is_empty());
    match &report.entries()[0].outcome {
        Outcome::Rejected { reason } => assert!(reason.contains("'X'")),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn test_unknown_model_in_model_sweep_is_rejected() {
    let ws = Workspace::new(&["A_4"]);
    let mut driver = ws.driver(0);

    let report = driver
        .run_model_sweep(&["A"], &[4], &["KMeans", "MSNet"], &["VCA"], false)
        .unwrap();

    assert_eq!(report.rejected().count(), 1);
    assert_eq!(report.launched().count(), 1);
    assert_eq!(driver.runner().commands.len(), 1);
}

#[test]
fn test_supervised_model_without_extractors_is_fatal() {
    let ws = Workspace::new(&["A_4"]);
    let mut driver = ws.driver(0);
    let none: [&str; 0] = [];

    let err = driver
        .run_model_sweep(&["A"], &[4], &["FCLS"], &none, false)
        .unwrap_err();
    assert!(matches!(err, Error::NoExtractors { ref model } if model == "FCLS"));
    assert!(driver.runner().commands.is_empty());
}

#[test]
fn test_blind_models_need_no_extractors() {
    let ws = Workspace::new(&["A_4"]);
    let mut driver = ws.driver(0);
    let none: [&str; 0] = [];

    let report = driver
        .run_model_sweep(&["A"], &[4], &["MiSiCNet"], &none, false)
        .unwrap();
    assert_eq!(report.launched().count(), 1);
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_dry_run_never_invokes_runner() {
    let ws = Workspace::new(&["A_4"]);
    let mut driver = ws.driver(0);

    let report = driver
        .run_sweep(&["A"], &[4], "FCLS", Some("VCA"), true)
        .unwrap();

    assert!(driver.runner().commands.is_empty());
    assert!(matches!(
        &report.entries()[0].outcome,
        Outcome::Launched { dry_run: true, .. }
    ));
    assert!(!ws
        .path()
        .join("experiments/supervised/VCA_FCLS_A_4")
        .exists());
}

#[test]
fn test_run_writes_manifest() {
    let ws = Workspace::new(&["A_4"]);
    let mut driver = ws.driver(0);

    driver
        .run_sweep(&["A"], &[4], "FCLS", Some("VCA"), false)
        .unwrap();

    let dir = ws.path().join("experiments/supervised/VCA_FCLS_A_4");
    let manifest = RunManifest::read(&dir).unwrap().unwrap();
    assert_eq!(manifest.model(), "FCLS");
    assert_eq!(manifest.extractor(), Some("VCA"));
    assert_eq!(manifest.scene(), "A");
    assert_eq!(manifest.resolution(), 4);
}

#[test]
fn test_non_zero_exit_stops_sweep() {
    let ws = Workspace::new(&["A_4", "B_4"]);
    let mut driver = ws.driver(2);

    let err = driver
        .run_sweep(&["A", "B"], &[4], "MSNet", None, false)
        .unwrap_err();

    assert_eq!(err.exit_code(), Some(2));
    assert_eq!(driver.runner().commands.len(), 1);
}

#[test]
fn test_run_config_keeps_other_keys() {
    let ws = Workspace::new(&["A_4"]);
    let mut driver = ws.driver(0);

    driver
        .run_sweep(&["A"], &[4], "MSNet", None, true)
        .unwrap();

    let config = RunConfig::load(ws.path().join("mlxp.yaml")).unwrap();
    let doc = config.document();
    assert_eq!(doc["seed"], serde_yaml::Value::from(42));
    assert_eq!(doc["trainer"]["epochs"], serde_yaml::Value::from(100));
    assert_eq!(config.forced_log_id(), Some(-1));
}

#[cfg(unix)]
#[test]
fn test_process_runner_forwards_exit_status() {
    use unmix_sweep::runner::ProcessRunner;

    let ws = Workspace::new(&["A_4"]);
    std::fs::write(ws.path().join("fail.sh"), "exit 3\n").unwrap();

    let toolkit = ToolkitConfig {
        interpreter: "sh".to_string(),
        script: "fail.sh".to_string(),
        workdir: ws.path().to_path_buf(),
    };
    let builder = InvocationBuilder::new(
        toolkit,
        ws.path().join("mlxp.yaml"),
        ws.path().join("experiments"),
    );
    let mut driver = SweepDriver::new(
        builder,
        ws.path().join("data"),
        ProcessRunner::new(ws.path()),
    );

    let err = driver
        .run_sweep(&["A"], &[4], "MSNet", None, false)
        .unwrap_err();
    assert!(matches!(err, Error::ExternalProcess { code: 3, .. }));
}
