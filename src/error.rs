//! Error types for unmix-sweep
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Only configuration problems and external process failures are errors in the
//! sweep path. A missing input data file or a missing metrics file is reported
//! as a diagnostic and never surfaces here.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// unmix-sweep error types
#[derive(Error, Debug)]
pub enum Error {
    /// Model name is not in the registry
    #[error("Unsupported model: '{0}'\nRun `unmix-sweep registry` to list accepted models")]
    UnsupportedModel(String),

    /// Extractor name is not in the registry
    #[error("Unsupported extractor: '{0}'\nRun `unmix-sweep registry` to list accepted extractors")]
    UnsupportedExtractor(String),

    /// Supervised model invoked without an extractor
    #[error("Model '{model}' is supervised and requires an extractor")]
    MissingExtractor {
        /// Supervised model name
        model: String,
    },

    /// Supervised model requested in a sweep with no extractors configured
    #[error("Model '{model}' is supervised but no extractors were given for the sweep")]
    NoExtractors {
        /// Supervised model name
        model: String,
    },

    /// External toolkit exited with a non-zero status (fatal)
    #[error("External process failed with exit status {code}: {command}")]
    ExternalProcess {
        /// Rendered command line
        command: String,
        /// Exit status reported by the child
        code: i32,
    },

    /// Result artifact does not carry the expected variables
    #[error("Malformed result artifact: {0}")]
    MalformedArtifact(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter query parsing error
    #[error("Filter parse error: {0}")]
    ParseError(String),

    /// Configuration document has an unexpected structure
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rendering backend failure
    #[error("Plot error: {0}")]
    Plot(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this is a configuration error (bad model/extractor selection).
    ///
    /// The sweep driver recovers from these per combination.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedModel(_)
                | Self::UnsupportedExtractor(_)
                | Self::MissingExtractor { .. }
                | Self::NoExtractors { .. }
        )
    }

    /// Exit status to terminate with, if this error came from the external toolkit.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExternalProcess { code, .. } => Some(*code),
            _ => None,
        }
    }
}
