//! Visualization of run estimates
//!
//! For each run two PNG files are written to the output directory:
//! - `run_{run}_abundances.png`: abundance map grid with shared colorbar
//! - `run_{run}_endmembers.png`: endmember spectra
//!
//! The two figures are independent: a run whose `A` is missing still gets its
//! spectra. Each failure is logged as an unfinished run and the remaining runs
//! are still plotted.

mod colormap;
mod font;
mod layout;
mod render;

pub use colormap::viridis;
pub use font::{init_font, text_available, FONT_ENV};
pub use layout::{ColorScale, GridLayout, Panel, ABUNDANCE_SCALE, GRID_COLUMNS};
pub use render::{render_abundance_grid, render_endmembers};

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::artifact::{estimates_path, AbundanceArtifact};
use crate::Result;

/// Abundance grid written for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceFigure {
    /// PNG file
    pub path: PathBuf,
    /// Layout of the grid
    pub layout: GridLayout,
}

/// Endmember spectra written for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct EndmemberFigure {
    /// PNG file
    pub path: PathBuf,
    /// Largest value in `E`
    pub max: f64,
}

/// Figures produced for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlots {
    /// Run identifier
    pub run: String,
    /// Abundance grid, if it could be drawn
    pub abundances: Option<AbundanceFigure>,
    /// Endmember spectra, if they could be drawn
    pub endmembers: Option<EndmemberFigure>,
}

impl RunPlots {
    /// Whether both figures were written.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.abundances.is_some() && self.endmembers.is_some()
    }
}

/// `run_{run}_abundances.png` under `out_dir`.
#[must_use]
pub fn abundance_figure_path(out_dir: &Path, run: &str) -> PathBuf {
    out_dir.join(format!("run_{run}_abundances.png"))
}

/// `run_{run}_endmembers.png` under `out_dir`.
#[must_use]
pub fn endmember_figure_path(out_dir: &Path, run: &str) -> PathBuf {
    out_dir.join(format!("run_{run}_endmembers.png"))
}

/// Render both figures for an in-memory artifact.
///
/// # Errors
///
/// Returns the first rendering error; the abundance grid is drawn first
pub fn plot_artifact(run: &str, artifact: &AbundanceArtifact, out_dir: &Path) -> Result<RunPlots> {
    let path = abundance_figure_path(out_dir, run);
    let layout = render_abundance_grid(artifact, &path)?;
    let abundances = AbundanceFigure { path, layout };

    let path = endmember_figure_path(out_dir, run);
    let max = render_endmembers(artifact, &path)?;
    let endmembers = EndmemberFigure { path, max };

    Ok(RunPlots {
        run: run.to_string(),
        abundances: Some(abundances),
        endmembers: Some(endmembers),
    })
}

/// Draw each figure on its own, logging every failure as an unfinished run.
///
/// Returns `None` only when neither figure could be drawn.
#[must_use]
pub fn render_run(run: &str, artifact: &AbundanceArtifact, out_dir: &Path) -> Option<RunPlots> {
    let path = abundance_figure_path(out_dir, run);
    let abundances = match render_abundance_grid(artifact, &path) {
        Ok(layout) => Some(AbundanceFigure { path, layout }),
        Err(e) => {
            warn!("This run ({run}) probably did not finish... ({e})");
            None
        }
    };

    let path = endmember_figure_path(out_dir, run);
    let endmembers = match render_endmembers(artifact, &path) {
        Ok(max) => Some(EndmemberFigure { path, max }),
        Err(e) => {
            warn!("This run ({run}) probably did not finish... ({e})");
            None
        }
    };

    if abundances.is_none() && endmembers.is_none() {
        return None;
    }
    Some(RunPlots {
        run: run.to_string(),
        abundances,
        endmembers,
    })
}

/// Load `{log_root}/{run}/artifacts/Estimate/estimates.mat` for each run and plot it.
///
/// Runs that cannot be loaded, or where neither figure can be drawn, are
/// logged and left out of the result.
///
/// # Errors
///
/// Returns error only if `out_dir` cannot be created
pub fn plot_runs<S: AsRef<str>>(log_root: &Path, runs: &[S], out_dir: &Path) -> Result<Vec<RunPlots>> {
    std::fs::create_dir_all(out_dir)?;

    let mut plotted = Vec::new();
    for run in runs {
        let run = run.as_ref();
        let path = estimates_path(log_root, run);
        let artifact = match AbundanceArtifact::load(&path) {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!("This run ({run}) probably did not finish... ({e})");
                continue;
            }
        };
        if let Some(plots) = render_run(run, &artifact, out_dir) {
            plotted.push(plots);
        }
    }
    Ok(plotted)
}
