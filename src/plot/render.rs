//! PNG rendering of abundance maps and endmember spectra

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use super::colormap::viridis;
use super::font::text_available;
use super::layout::{ColorScale, GridLayout};
use crate::artifact::{Abundances, AbundanceArtifact, Endmembers};
use crate::{Error, Result};

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const PANEL_PIXELS: u32 = 320;
const CELL_MARGIN: i32 = 8;
/// Room for the subplot title above each map.
const TITLE_PIXELS: u32 = 40;
const COLORBAR_PIXELS: u32 = 90;
const COLORBAR_STEPS: usize = 256;
const SPECTRA_SIZE: (u32, u32) = (1000, 600);

#[allow(clippy::needless_pass_by_value)]
fn plot_error(e: Box<dyn std::error::Error>) -> Error {
    Error::Plot(e.to_string())
}

/// Draw one abundance map per endmember in a 3-column grid with a shared
/// horizontal colorbar labelled "Abundance", written as PNG.
///
/// Maps are drawn on the fixed [0, 1] scale whatever their actual range. Each
/// cell is at least as large as the map, so every map pixel stays visible.
///
/// # Errors
///
/// Returns `MalformedArtifact` if `E` or `A` is missing, `A` holds fewer maps
/// than `E` has columns, or there are no endmembers; `Plot` if drawing fails
pub fn render_abundance_grid(artifact: &AbundanceArtifact, out: &Path) -> Result<GridLayout> {
    let endmembers = artifact.require_endmembers()?;
    let abundances = artifact.require_abundances()?;

    let n = endmembers.count();
    if abundances.count() < n {
        return Err(Error::MalformedArtifact(format!(
            "E has {n} endmembers but A holds only {} maps",
            abundances.count()
        )));
    }

    let layout = GridLayout::for_endmembers(n)?;
    write_abundance_grid(&layout, abundances, out, text_available()).map_err(plot_error)?;
    Ok(layout)
}

/// Plot every column of `E` against band index and report the maximum of `E`.
///
/// # Errors
///
/// Returns `MalformedArtifact` if `E` is missing or empty; `Plot` if drawing fails
pub fn render_endmembers(artifact: &AbundanceArtifact, out: &Path) -> Result<f64> {
    let endmembers = artifact.require_endmembers()?;
    let (Some(min), Some(max)) = (endmembers.min(), endmembers.max()) else {
        return Err(Error::MalformedArtifact("E holds no values".to_string()));
    };

    info!("Endmember max: {max}");
    draw_endmembers(endmembers, min, max, out, text_available()).map_err(plot_error)?;
    Ok(max)
}

/// Side of one grid cell: the larger map dimension plus margins and title, at least `PANEL_PIXELS`.
fn cell_pixels(abundances: &Abundances) -> u32 {
    let side = abundances.height().max(abundances.width());
    u32::try_from(side)
        .unwrap_or(u32::MAX)
        .saturating_add(2 * CELL_MARGIN.unsigned_abs() + TITLE_PIXELS)
        .max(PANEL_PIXELS)
}

#[allow(clippy::cast_possible_truncation)]
fn abundance_canvas(layout: &GridLayout, abundances: &Abundances) -> (u32, u32) {
    let cell = cell_pixels(abundances);
    (
        cell.saturating_mul(layout.cols() as u32),
        cell.saturating_mul(layout.rows() as u32)
            .saturating_add(COLORBAR_PIXELS),
    )
}

fn write_abundance_grid(
    layout: &GridLayout,
    abundances: &Abundances,
    out: &Path,
    text: bool,
) -> DrawResult<()> {
    let root = BitMapBackend::new(out, abundance_canvas(layout, abundances)).into_drawing_area();
    draw_abundance_grid(&root, layout, abundances, text)?;
    root.present()?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn draw_abundance_grid<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    layout: &GridLayout,
    abundances: &Abundances,
    text: bool,
) -> DrawResult<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let grid_height = cell_pixels(abundances).saturating_mul(layout.rows() as u32);
    let (grid, bar) = root.split_vertically(i32::try_from(grid_height)?);
    let cells = grid.split_evenly((layout.rows(), layout.cols()));

    for (cell, panel) in cells.iter().zip(layout.panels()) {
        // Blank trailing cells: axes off, nothing drawn
        let Some(index) = panel.image() else {
            continue;
        };
        let map = abundances
            .map(index)
            .ok_or_else(|| format!("no abundance map for endmember {index}"))?;

        let area = cell.margin(CELL_MARGIN, CELL_MARGIN, CELL_MARGIN, CELL_MARGIN);
        let area = match panel.title() {
            Some(title) if text => area.titled(title, ("sans-serif", 18))?,
            _ => area,
        };
        draw_map(
            &area,
            map,
            abundances.height(),
            abundances.width(),
            layout.scale(),
        )?;
    }

    draw_colorbar(&bar, layout.scale(), "Abundance", text)?;
    Ok(())
}

/// Nearest-neighbour upscale of a row-major map into the top-left of `area`,
/// keeping the aspect ratio.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn draw_map<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    map: &[f64],
    height: usize,
    width: usize,
    scale: ColorScale,
) -> DrawResult<()>
where
    DB::ErrorType: 'static,
{
    let (pw, ph) = area.dim_in_pixel();
    if height == 0 || width == 0 || pw == 0 || ph == 0 {
        return Ok(());
    }

    let zoom = (f64::from(pw) / width as f64).min(f64::from(ph) / height as f64);
    let target_w = ((width as f64 * zoom) as usize).max(1);
    let target_h = ((height as f64 * zoom) as usize).max(1);

    for py in 0..target_h {
        let y = py * height / target_h;
        for px in 0..target_w {
            let x = px * width / target_w;
            let (r, g, b) = viridis(scale.normalize(map[y * width + x]));
            area.draw_pixel((px as i32, py as i32), &RGBColor(r, g, b))?;
        }
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scale: ColorScale,
    label: &str,
    text: bool,
) -> DrawResult<()>
where
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(area);
    builder.margin_left(40).margin_right(40).margin_top(10);
    if text {
        builder.x_label_area_size(45);
    }
    let mut chart = builder.build_cartesian_2d(scale.vmin..scale.vmax, 0.0..1.0)?;

    if text {
        chart
            .configure_mesh()
            .disable_mesh()
            .disable_y_axis()
            .x_labels(6)
            .x_desc(label)
            .x_label_formatter(&|v| format!("{v:.1}"))
            .draw()?;
    }

    let step = (scale.vmax - scale.vmin) / COLORBAR_STEPS as f64;
    chart.draw_series((0..COLORBAR_STEPS).map(|i| {
        let v0 = (i as f64).mul_add(step, scale.vmin);
        let (r, g, b) = viridis(scale.normalize(v0 + step / 2.0));
        Rectangle::new([(v0, 0.0), (v0 + step, 1.0)], RGBColor(r, g, b).filled())
    }))?;
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn draw_endmembers(
    endmembers: &Endmembers,
    min: f64,
    max: f64,
    out: &Path,
    text: bool,
) -> DrawResult<()> {
    let root = BitMapBackend::new(out, SPECTRA_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = (endmembers.bands().saturating_sub(1) as f64).max(1.0);
    let pad = if (max - min).abs() < f64::EPSILON {
        0.5
    } else {
        (max - min) * 0.05
    };

    let mut builder = ChartBuilder::on(&root);
    builder.margin(10);
    if text {
        builder
            .caption(
                format!("Endmembers: {}", endmembers.count()),
                ("sans-serif", 24),
            )
            .x_label_area_size(40)
            .y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(0.0..x_max, (min - pad)..(max + pad))?;

    if text {
        chart
            .configure_mesh()
            .x_desc("Band")
            .y_desc("Reflectance")
            .draw()?;
    }

    for (i, column) in endmembers.columns().iter().enumerate() {
        let points = column.iter().enumerate().map(|(band, &v)| (band as f64, v));
        chart
            .draw_series(LineSeries::new(points, &Palette99::pick(i)))?
            .label(format!("Endmember {}", i + 1))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], Palette99::pick(i)));
    }

    if text {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}
