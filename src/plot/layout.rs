//! Abundance grid layout
//!
//! Pure description of what the abundance figure contains, kept apart from the
//! drawing code so it can be checked without rendering.

use crate::{Error, Result};

/// Columns of the abundance grid.
pub const GRID_COLUMNS: usize = 3;

/// Fixed colour range of abundance maps.
pub const ABUNDANCE_SCALE: ColorScale = ColorScale { vmin: 0.0, vmax: 1.0 };

/// Value range mapped onto the colormap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    /// Value drawn with the first colormap colour
    pub vmin: f64,
    /// Value drawn with the last colormap colour
    pub vmax: f64,
}

impl ColorScale {
    /// Position of `value` on the colormap, clipped to `[0, 1]`. NaN maps to 0.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span.abs() < f64::EPSILON || value.is_nan() {
            return 0.0;
        }
        ((value - self.vmin) / span).clamp(0.0, 1.0)
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    title: Option<String>,
    image: Option<usize>,
}

impl Panel {
    /// Subplot title, for cells holding an image.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Endmember whose abundance map is drawn here; `None` for trailing blank cells.
    #[must_use]
    pub const fn image(&self) -> Option<usize> {
        self.image
    }
}

/// Grid of abundance maps sharing one horizontal colorbar.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    rows: usize,
    cols: usize,
    panels: Vec<Panel>,
    colorbar_source: usize,
    scale: ColorScale,
}

impl GridLayout {
    /// Layout for `n` endmembers: 3 columns, `ceil(n / 3)` rows, one row when `n < 3`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArtifact` for `n == 0`: the colorbar needs an image to
    /// take its scale from
    pub fn for_endmembers(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::MalformedArtifact(
                "no endmembers to render, the colorbar needs at least one image".to_string(),
            ));
        }

        let rows = if n < GRID_COLUMNS {
            1
        } else {
            n.div_ceil(GRID_COLUMNS)
        };
        let panels = (0..rows * GRID_COLUMNS)
            .map(|cell| {
                if cell < n {
                    Panel {
                        title: Some(format!("Endmember: {}", cell + 1)),
                        image: Some(cell),
                    }
                } else {
                    Panel {
                        title: None,
                        image: None,
                    }
                }
            })
            .collect();

        Ok(Self {
            rows,
            cols: GRID_COLUMNS,
            panels,
            colorbar_source: n - 1,
            scale: ABUNDANCE_SCALE,
        })
    }

    /// Grid rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Grid columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Cells in row-major order.
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Number of cells that hold an image.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.panels.iter().filter(|p| p.image.is_some()).count()
    }

    /// Endmember whose image the colorbar refers to (the last one drawn).
    #[must_use]
    pub const fn colorbar_source(&self) -> usize {
        self.colorbar_source
    }

    /// Colour scale of every image and the colorbar.
    #[must_use]
    pub const fn scale(&self) -> ColorScale {
        self.scale
    }
}
