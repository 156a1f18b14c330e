//! Error types for perfcal.

use thiserror::Error;

/// Errors that can occur in perfcal operations.
///
/// Dirty source rows never surface here: they are logged and skipped by the
/// loaders. These variants cover configuration mistakes and sources that
/// cannot be read at all.
#[derive(Error, Debug)]
pub enum PerfcalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("ICS parse error: {0}")]
    FeedParse(String),

    #[error("Calendar bundle error: {0}")]
    Archive(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for perfcal operations.
pub type PerfcalResult<T> = Result<T, PerfcalError>;
