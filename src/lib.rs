//! # unmix-sweep: Experiment Orchestration for Hyperspectral Unmixing
//!
//! Drives an external unmixing toolkit over every combination of scene theme,
//! resolution, model and extractor, then collects and visualizes what the runs
//! produced.
//!
//! ## Components
//!
//! - **Registry** ([`registry`]): accepted models (with their supervised/blind
//!   mode) and extractors
//! - **Invocation** ([`invocation`]): validates a selection, rewrites the
//!   toolkit's run config and renders the command line
//! - **Sweep** ([`sweep`]): resolutions × themes × models × extractors, with
//!   input checks and blocking execution
//! - **Results** ([`experiment`], [`query`]): metrics of finished runs, filtered
//!   by exact key/value matches or a SQL `WHERE` predicate
//! - **Plots** ([`artifact`], [`plot`]): abundance maps and endmember spectra
//!   from `.mat` estimates
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use unmix_sweep::config::SweepConfig;
//! use unmix_sweep::invocation::InvocationBuilder;
//! use unmix_sweep::runner::ProcessRunner;
//! use unmix_sweep::sweep::SweepDriver;
//!
//! let config = SweepConfig::load(None)?;
//! let mut driver = SweepDriver::new(
//!     InvocationBuilder::from_config(&config),
//!     &config.paths.data_dir,
//!     ProcessRunner::new(&config.toolkit.workdir),
//! );
//!
//! let report = driver.run_model_sweep(
//!     &["FDS1", "FDS2"],
//!     &[4, 8],
//!     &["FCLS", "MSNet"],
//!     &["VCA"],
//!     true,
//! )?;
//! println!("{} combinations visited", report.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod artifact;
pub mod config;
pub mod error;
pub mod experiment;
pub mod invocation;
pub mod logging;
pub mod plot;
pub mod query;
pub mod registry;
pub mod runner;
pub mod sweep;

pub use error::{Error, Result};
