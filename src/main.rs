//! unmix-sweep command line

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueHint};
use serde_json::Value;
use tracing::{error, info};

use unmix_sweep::config::SweepConfig;
use unmix_sweep::experiment::ResultStore;
use unmix_sweep::invocation::InvocationBuilder;
use unmix_sweep::logging::init_logging;
use unmix_sweep::plot::{init_font, plot_runs};
use unmix_sweep::query::{print_matches, QueryEngine};
use unmix_sweep::registry::{Extractor, Model};
use unmix_sweep::runner::ProcessRunner;
use unmix_sweep::sweep::SweepDriver;

#[derive(Parser, Debug)]
#[command(name = "unmix-sweep", version, about = "Hyperspectral unmixing experiment sweeps")]
struct Cli {
    /// Sweep configuration file (YAML)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the toolkit over models x extractors x resolutions x themes
    Sweep {
        /// Scene theme (repeatable)
        #[arg(short, long = "theme")]
        themes: Vec<String>,

        /// Spatial resolution (repeatable)
        #[arg(short, long = "resolution")]
        resolutions: Vec<u32>,

        /// Model name (repeatable)
        #[arg(short, long = "model")]
        models: Vec<String>,

        /// Extractor name for supervised models (repeatable)
        #[arg(short, long = "extractor")]
        extractors: Vec<String>,

        /// Log commands without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Collect SAD metrics of finished runs and print the matching ones
    Results {
        /// Directory whose subdirectories are run results (e.g. experiments/supervised)
        #[arg(value_hint = ValueHint::DirPath)]
        root: PathBuf,

        /// Field to match (pairs with --value, repeatable)
        #[arg(short, long = "key")]
        keys: Vec<String>,

        /// String value to match (pairs with --key, repeatable)
        #[arg(short, long = "value")]
        values: Vec<String>,

        /// SQL WHERE expression, e.g. "unmixer_name = 'FCLS' AND sad < 0.2"
        #[arg(short, long = "where", conflicts_with_all = ["keys", "values"])]
        filter: Option<String>,
    },

    /// Plot abundance maps and endmember spectra of logged runs
    Plot {
        /// Run ids under the log root (repeatable)
        #[arg(short, long = "run", required = true)]
        runs: Vec<String>,

        /// Root of {run}/artifacts/Estimate/estimates.mat
        #[arg(long, value_hint = ValueHint::DirPath)]
        log_root: Option<PathBuf>,

        /// Output directory for PNG figures
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
    },

    /// List accepted models and extractors
    Registry,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match SweepConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Forward the toolkit's exit status unchanged
            if let Some(code) = e
                .downcast_ref::<unmix_sweep::Error>()
                .and_then(unmix_sweep::Error::exit_code)
            {
                error!("{e}");
                std::process::exit(code);
            }
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, mut config: SweepConfig) -> anyhow::Result<()> {
    match command {
        Commands::Sweep {
            themes,
            resolutions,
            models,
            extractors,
            dry_run,
        } => {
            let plan = &mut config.sweep;
            override_if_given(&mut plan.themes, themes);
            override_if_given(&mut plan.resolutions, resolutions);
            override_if_given(&mut plan.models, models);
            override_if_given(&mut plan.extractors, extractors);
            plan.dry_run |= dry_run;

            let mut driver = SweepDriver::new(
                InvocationBuilder::from_config(&config),
                &config.paths.data_dir,
                ProcessRunner::new(&config.toolkit.workdir),
            );
            let plan = &config.sweep;
            let report = driver.run_model_sweep(
                &plan.themes,
                &plan.resolutions,
                &plan.models,
                &plan.extractors,
                plan.dry_run,
            )?;

            info!(
                launched = report.launched().count(),
                skipped = report.skipped().count(),
                rejected = report.rejected().count(),
                "sweep finished"
            );
            Ok(())
        }

        Commands::Results {
            root,
            keys,
            values,
            filter,
        } => {
            let store = ResultStore::collect(&root)
                .with_context(|| format!("collecting results under {}", root.display()))?;
            info!(records = store.len(), "results collected");

            let matches = if let Some(filter) = filter {
                let predicate = QueryEngine::new().parse_filter(&filter)?;
                store.filter(&predicate)
            } else {
                let values: Vec<Value> = values.into_iter().map(Value::String).collect();
                store.filter_by(&keys, &values)?
            };

            print_matches(&mut io::stdout().lock(), &matches)?;
            Ok(())
        }

        Commands::Plot {
            runs,
            log_root,
            out,
        } => {
            let log_root = log_root.unwrap_or(config.paths.log_root);
            let out = out.unwrap_or(config.paths.plot_dir);
            init_font(config.paths.font.as_deref());
            let plotted = plot_runs(&log_root, &runs, &out)?;
            for plots in &plotted {
                if let Some(figure) = &plots.abundances {
                    info!(run = %plots.run, path = %figure.path.display(), "abundance grid written");
                }
                if let Some(figure) = &plots.endmembers {
                    info!(run = %plots.run, path = %figure.path.display(), "endmember spectra written");
                }
            }
            Ok(())
        }

        Commands::Registry => {
            println!("Models:");
            for model in Model::ALL {
                println!("  {:<10} {}", model.name(), model.mode());
            }
            println!("Extractors:");
            for extractor in Extractor::ALL {
                println!("  {}", extractor.name());
            }
            Ok(())
        }
    }
}

fn override_if_given<T>(target: &mut Vec<T>, given: Vec<T>) {
    if !given.is_empty() {
        *target = given;
    }
}
