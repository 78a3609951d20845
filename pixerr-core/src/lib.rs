//! pixerr-core: Core types and geometry for pixel module read-out error analysis.
//!
//! This crate provides the foundational pieces shared by the I/O and analysis
//! crates: the readout-chip to module geometry, hit records, chip and module
//! maps, and the rate and histogram statistics.
//!

pub mod error;
pub mod geometry;
pub mod hit;
pub mod map;
pub mod soa;
pub mod stats;

pub use error::{Error, Result};
pub use geometry::{ChipCoord, ChipOutline, ModuleCoord, ModuleGeometry};
pub use hit::{ErrorKind, HitField, HitRecord};
pub use map::{ChipMap, ModuleMap};
pub use soa::HitBatch;
pub use stats::{Histogram1D, PoissonFit, PoissonSeed, Profile1D};
