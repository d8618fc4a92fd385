//! Model and extractor registry
//!
//! Closed sets of accepted names. [`Model::mode`] is the only place a model is
//! mapped to its unmixing regime, so the accepted-model list and the mode
//! resolution cannot drift apart.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Unmixing regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Endmembers are given (by an extractor)
    Supervised,
    /// Endmembers are estimated by the model itself
    Blind,
}

impl Mode {
    /// Directory / command-line spelling of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Supervised => "supervised",
            Self::Blind => "blind",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unmixing model accepted by the external toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    /// Fully constrained least squares
    Fcls,
    /// Deep image prior unmixing
    UnDip,
    /// Minimum simplex convolutional network
    MiSiCNet,
    /// Multi-stage network
    MsNet,
}

impl Model {
    /// Every accepted model, in listing order.
    pub const ALL: [Self; 4] = [Self::Fcls, Self::UnDip, Self::MiSiCNet, Self::MsNet];

    /// Name as understood by the toolkit.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fcls => "FCLS",
            Self::UnDip => "UnDIP",
            Self::MiSiCNet => "MiSiCNet",
            Self::MsNet => "MSNet",
        }
    }

    /// Regime the model runs in.
    #[must_use]
    pub const fn mode(self) -> Mode {
        match self {
            Self::Fcls | Self::UnDip => Mode::Supervised,
            Self::MiSiCNet | Self::MsNet => Mode::Blind,
        }
    }

    /// Supervised models need an extractor.
    #[must_use]
    pub const fn requires_extractor(self) -> bool {
        matches!(self.mode(), Mode::Supervised)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::UnsupportedModel(s.to_string()))
    }
}

/// Endmember extractor accepted by the external toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extractor {
    /// Vertex component analysis
    Vca,
    /// Simplex volume maximization
    SiVm,
    /// Simplex identification via split augmented Lagrangian
    Sisal,
    /// Alternating volume maximization
    Avmax,
    /// N-FINDR
    Nfindr,
}

impl Extractor {
    /// Every accepted extractor, in listing order.
    pub const ALL: [Self; 5] = [Self::Vca, Self::SiVm, Self::Sisal, Self::Avmax, Self::Nfindr];

    /// Name as understood by the toolkit.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vca => "VCA",
            Self::SiVm => "SiVM",
            Self::Sisal => "SISAL",
            Self::Avmax => "AVMAX",
            Self::Nfindr => "NFINDR",
        }
    }
}

impl fmt::Display for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Extractor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| Error::UnsupportedExtractor(s.to_string()))
    }
}
