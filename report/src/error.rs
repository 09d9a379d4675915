//! Error types for report generation

use thiserror::Error;

/// Report error type
#[derive(Error, Debug)]
pub enum ReportError {
    /// File could not be opened, created or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Chart rendering failed
    #[error("plot error: {0}")]
    Plot(String),

    /// Nothing to report on
    #[error("no data: {0}")]
    Empty(String),
}

impl ReportError {
    /// Create a plot error from any drawing error
    pub fn plot(error: impl std::fmt::Display) -> Self {
        ReportError::Plot(error.to_string())
    }
}

/// Result type alias
pub type ReportResult<T> = std::result::Result<T, ReportError>;
