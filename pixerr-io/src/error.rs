//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// No backing file for the requested run.
    #[error("could not find run {run} in {dir:?}")]
    RunNotFound { run: u32, dir: PathBuf },

    /// Result cache error.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] pixerr_core::Error),
}

/// Result cache error types.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `run` was called before `set_path`.
    #[error("cache path has not been set")]
    PathNotSet,

    /// A cache file exists but cannot be decoded.
    #[error("corrupt cache file {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// A value could not be encoded.
    #[error("failed to encode cache value: {0}")]
    Encode(String),

    /// File I/O error.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}
