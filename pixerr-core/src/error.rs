//! Error types for pixerr-core.

use thiserror::Error;

/// Result type alias for pixerr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for pixerr operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Readout-chip address outside the chip geometry.
    #[error("invalid chip coordinate: chip {chip}, col {col}, row {row}")]
    InvalidCoordinate { chip: u8, col: u8, row: u8 },

    /// Module coordinate outside the module geometry.
    #[error("invalid module coordinate: ({x}, {y})")]
    InvalidModuleCoordinate { x: u16, y: u16 },

    /// Two maps with different shapes were combined.
    #[error("map shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Histogram binning cannot be built from the given parameters.
    #[error("invalid binning: {0}")]
    InvalidBinning(String),

    /// A fit was requested on a histogram without entries.
    #[error("cannot fit an empty histogram")]
    EmptyHistogram,
}
