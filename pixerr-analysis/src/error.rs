//! Error types for pixerr-analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Analysis error types.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No backing file for a run.
    #[error("could not find run {run} in {dir:?}")]
    RunNotFound { run: u32, dir: PathBuf },

    /// None of the requested runs or plans could be loaded.
    #[error("empty collection: {0}")]
    EmptyCollection(String),

    /// A selection-consuming operation found no selected runs.
    #[error("the run selection is empty")]
    EmptySelection,

    /// Event store or catalog error.
    #[error("I/O error: {0}")]
    Io(pixerr_io::Error),

    /// Result cache error.
    #[error("cache error: {0}")]
    Cache(#[from] pixerr_io::CacheError),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] pixerr_core::Error),

    /// Run plan or configuration file error.
    #[error("file error: {0}")]
    File(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Plot output error.
    #[error("draw error: {0}")]
    Draw(#[from] DrawError),
}

impl AnalysisError {
    /// True for errors a collection recovers from by skipping the run or plan.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RunNotFound { .. } | Self::EmptyCollection(_))
    }
}

impl From<pixerr_io::Error> for AnalysisError {
    fn from(err: pixerr_io::Error) -> Self {
        match err {
            pixerr_io::Error::RunNotFound { run, dir } => Self::RunNotFound { run, dir },
            pixerr_io::Error::Cache(e) => Self::Cache(e),
            other => Self::Io(other),
        }
    }
}

/// Plot output error types.
#[derive(Error, Debug)]
pub enum DrawError {
    /// The sink has no output target.
    #[error("no canvas to draw on")]
    NoCanvas,

    /// Plot file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Plot encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
