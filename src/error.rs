//! Error taxonomy shared by every pipeline stage.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No document retains a usable term after cleaning and row filtering.
    #[error("corpus is empty: no document retains any term after cleaning")]
    EmptyCorpus,

    #[error("invalid topic count {k}: must be between 1 and {max}")]
    InvalidTopicCount { k: usize, max: usize },

    #[error("invalid hyperparameter: {0}")]
    InvalidParameter(String),

    /// The fit was stopped through its cancellation token.
    #[error("fitting cancelled before iteration {iteration}")]
    Cancelled { iteration: usize },

    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
