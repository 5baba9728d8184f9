//! Error types for qs-stats.

use thiserror::Error;

/// Errors that can occur when writing the metrics log.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("metrics writer thread panicked")]
    WriterPanicked,
}

/// Alias for `Result<T, StatsError>`.
pub type StatsResult<T> = Result<T, StatsError>;
