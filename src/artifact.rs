//! Unmixing result artifacts
//!
//! A run's estimate file is a MAT v5 file holding:
//! - `E`: endmember matrix, bands × endmembers
//! - `A`: abundance tensor, endmembers × height × width
//!
//! MAT arrays are column-major; both are converted on load so that each
//! endmember is a contiguous column and each abundance map a contiguous
//! row-major image.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Variable name of the endmember matrix.
pub const ENDMEMBERS_VAR: &str = "E";
/// Variable name of the abundance tensor.
pub const ABUNDANCES_VAR: &str = "A";

/// Where the toolkit stores a run's estimates: `{log_root}/{run}/artifacts/Estimate/estimates.mat`.
#[must_use]
pub fn estimates_path(log_root: &Path, run: &str) -> PathBuf {
    log_root
        .join(run)
        .join("artifacts")
        .join("Estimate")
        .join("estimates.mat")
}

/// Endmember spectra, one column per endmember.
#[derive(Debug, Clone, PartialEq)]
pub struct Endmembers {
    bands: usize,
    columns: Vec<Vec<f64>>,
}

impl Endmembers {
    /// Build from columns; every column must have the same length.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArtifact` if column lengths differ
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self> {
        let bands = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|c| c.len() != bands) {
            return Err(Error::MalformedArtifact(
                "endmember columns have different lengths".to_string(),
            ));
        }
        Ok(Self { bands, columns })
    }

    /// Build from column-major data of shape `bands × count`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArtifact` if the data length does not match the shape
    pub fn from_column_major(bands: usize, count: usize, data: &[f64]) -> Result<Self> {
        if data.len() != bands * count {
            return Err(Error::MalformedArtifact(format!(
                "E: expected {} values for {bands}x{count}, found {}",
                bands * count,
                data.len()
            )));
        }
        let columns = if bands == 0 {
            vec![Vec::new(); count]
        } else {
            data.chunks(bands).map(<[f64]>::to_vec).collect()
        };
        Ok(Self { bands, columns })
    }

    /// Number of spectral bands (rows).
    #[must_use]
    pub const fn bands(&self) -> usize {
        self.bands
    }

    /// Number of endmembers (columns).
    #[must_use]
    pub fn count(&self) -> usize {
        self.columns.len()
    }

    /// Spectrum of endmember `i`.
    #[must_use]
    pub fn column(&self, i: usize) -> Option<&[f64]> {
        self.columns.get(i).map(Vec::as_slice)
    }

    /// All spectra.
    #[must_use]
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Largest value, ignoring NaN; `None` when empty.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.columns
            .iter()
            .flatten()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }

    /// Smallest value, ignoring NaN; `None` when empty.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.columns
            .iter()
            .flatten()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::min)
    }
}

/// Abundance maps, one `height × width` image per endmember.
#[derive(Debug, Clone, PartialEq)]
pub struct Abundances {
    height: usize,
    width: usize,
    maps: Vec<Vec<f64>>,
}

impl Abundances {
    /// Build from row-major maps of identical shape.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArtifact` if any map is not `height * width` long
    pub fn from_maps(height: usize, width: usize, maps: Vec<Vec<f64>>) -> Result<Self> {
        if maps.iter().any(|m| m.len() != height * width) {
            return Err(Error::MalformedArtifact(format!(
                "A: every abundance map must hold {height}x{width} values"
            )));
        }
        Ok(Self {
            height,
            width,
            maps,
        })
    }

    /// Build from column-major data of shape `count × height × width`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArtifact` if the data length does not match the shape
    pub fn from_column_major(
        count: usize,
        height: usize,
        width: usize,
        data: &[f64],
    ) -> Result<Self> {
        if data.len() != count * height * width {
            return Err(Error::MalformedArtifact(format!(
                "A: expected {} values for {count}x{height}x{width}, found {}",
                count * height * width,
                data.len()
            )));
        }

        let mut maps = vec![vec![0.0; height * width]; count];
        for (i, map) in maps.iter_mut().enumerate() {
            for y in 0..height {
                for x in 0..width {
                    map[y * width + x] = data[i + count * (y + height * x)];
                }
            }
        }
        Ok(Self {
            height,
            width,
            maps,
        })
    }

    /// Number of maps.
    #[must_use]
    pub fn count(&self) -> usize {
        self.maps.len()
    }

    /// Map height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Map width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Row-major map of endmember `i`.
    #[must_use]
    pub fn map(&self, i: usize) -> Option<&[f64]> {
        self.maps.get(i).map(Vec::as_slice)
    }
}

/// Estimates of one run. Either variable may be absent when the run did not finish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbundanceArtifact {
    /// `E`
    pub endmembers: Option<Endmembers>,
    /// `A`
    pub abundances: Option<Abundances>,
}

impl AbundanceArtifact {
    /// Artifact with both variables present.
    #[must_use]
    pub const fn new(endmembers: Endmembers, abundances: Abundances) -> Self {
        Self {
            endmembers: Some(endmembers),
            abundances: Some(abundances),
        }
    }

    /// Load `E` and `A` from a MAT file. Absent variables load as `None`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be opened and `MalformedArtifact` if it
    /// is not a MAT file or a present variable has the wrong rank or type
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mat = matfile::MatFile::parse(BufReader::new(file)).map_err(|e| {
            Error::MalformedArtifact(format!("{}: not a readable MAT file: {e:?}", path.display()))
        })?;

        let endmembers = match mat.find_by_name(ENDMEMBERS_VAR) {
            Some(array) => {
                let (dims, data) = numeric(array)?;
                let &[bands, count] = dims.as_slice() else {
                    return Err(Error::MalformedArtifact(format!(
                        "E must be 2-D, found shape {dims:?}"
                    )));
                };
                Some(Endmembers::from_column_major(bands, count, &data)?)
            }
            None => None,
        };

        let abundances = match mat.find_by_name(ABUNDANCES_VAR) {
            Some(array) => {
                let (dims, data) = numeric(array)?;
                let &[count, height, width] = dims.as_slice() else {
                    return Err(Error::MalformedArtifact(format!(
                        "A must be 3-D, found shape {dims:?}"
                    )));
                };
                Some(Abundances::from_column_major(count, height, width, &data)?)
            }
            None => None,
        };

        Ok(Self {
            endmembers,
            abundances,
        })
    }

    /// `E`, or `MalformedArtifact` when missing.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArtifact` if `E` is absent
    pub fn require_endmembers(&self) -> Result<&Endmembers> {
        self.endmembers
            .as_ref()
            .ok_or_else(|| Error::MalformedArtifact(format!("missing variable '{ENDMEMBERS_VAR}'")))
    }

    /// `A`, or `MalformedArtifact` when missing.
    ///
    /// # Errors
    ///
    /// Returns `MalformedArtifact` if `A` is absent
    pub fn require_abundances(&self) -> Result<&Abundances> {
        self.abundances
            .as_ref()
            .ok_or_else(|| Error::MalformedArtifact(format!("missing variable '{ABUNDANCES_VAR}'")))
    }
}

fn numeric(array: &matfile::Array) -> Result<(Vec<usize>, Vec<f64>)> {
    let dims = array.size().to_vec();
    let data = match array.data() {
        matfile::NumericData::Double { real, .. } => real.clone(),
        matfile::NumericData::Single { real, .. } => real.iter().map(|&v| f64::from(v)).collect(),
        _ => {
            return Err(Error::MalformedArtifact(format!(
                "'{}' is not a floating point array",
                array.name()
            )))
        }
    };
    Ok((dims, data))
}
