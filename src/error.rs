use std::path::PathBuf;

use thiserror::Error;

/// Every failure the pipeline can report to its caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error for file '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Unreadable content, no usable delimiter, or too few data rows.
    #[error("Failed to parse spectrum: {0}")]
    Parse(String),

    /// Degenerate point set for a background construction.
    #[error("Degenerate geometry: {0}")]
    Geometry(String),

    /// Least-squares fit or calibration inversion did not converge.
    #[error("Did not converge: {0}")]
    FitConvergence(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Failed to process table file '{0}': {1}")]
    Csv(String, #[source] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
