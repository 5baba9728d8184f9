//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need to surface configuration problems.

use thiserror::Error;

/// The error type for `qs-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid distribution parameter: {0}")]
    Distribution(String),
}

/// Shorthand result type for `qs-core`.
pub type CoreResult<T> = Result<T, CoreError>;
