//! Per-chip and per-module pixel maps.
//!
//! [`ChipMap`] stores values indexed `[chip][col][row]` in read-out
//! addressing. [`ModuleMap`] stores values indexed `[x][y]` in module
//! coordinates, see [`ModuleGeometry`] for the transform between the two.

use crate::geometry::ModuleGeometry;
use crate::hit::HitRecord;
use crate::{Error, Result};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Values per pixel in read-out addressing, shape `(n_chips, n_cols, n_rows)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipMap {
    data: Array3<f64>,
}

impl ChipMap {
    /// Creates a zeroed map for the given geometry.
    #[must_use]
    pub fn new(geometry: &ModuleGeometry) -> Self {
        Self {
            data: Array3::zeros((
                usize::from(geometry.n_chips),
                usize::from(geometry.n_cols),
                usize::from(geometry.n_rows),
            )),
        }
    }

    /// Counts one hit at its read-out address. Returns false for a hit
    /// outside the geometry.
    pub fn fill_hit(&mut self, hit: &HitRecord) -> bool {
        self.fill(hit.chip, hit.col, hit.row, 1.0)
    }

    /// Builds a map where every row of a `(chip, col)` pair carries the
    /// same value from a `(n_chips, n_cols)` table.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the table does not match the geometry.
    pub fn broadcast_columns(geometry: &ModuleGeometry, per_column: &Array2<f64>) -> Result<Self> {
        let expected = [usize::from(geometry.n_chips), usize::from(geometry.n_cols)];
        if per_column.shape() != expected {
            return Err(Error::ShapeMismatch {
                expected: expected.to_vec(),
                found: per_column.shape().to_vec(),
            });
        }
        let mut map = Self::new(geometry);
        for ((chip, col, _row), value) in map.data.indexed_iter_mut() {
            *value = per_column[[chip, col]];
        }
        Ok(map)
    }

    /// Shape as `(n_chips, n_cols, n_rows)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Adds `weight` to a pixel. Returns false if the address is outside the map.
    pub fn fill(&mut self, chip: u8, col: u8, row: u8, weight: f64) -> bool {
        match self
            .data
            .get_mut([usize::from(chip), usize::from(col), usize::from(row)])
        {
            Some(v) => {
                *v += weight;
                true
            }
            None => false,
        }
    }

    /// Value of a pixel, `None` outside the map.
    #[must_use]
    pub fn get(&self, chip: u8, col: u8, row: u8) -> Option<f64> {
        self.data
            .get([usize::from(chip), usize::from(col), usize::from(row)])
            .copied()
    }

    /// `(n_cols, n_rows)` view of a single chip.
    ///
    /// # Panics
    /// Panics if `chip` is not below the chip count.
    #[must_use]
    pub fn chip(&self, chip: u8) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), usize::from(chip))
    }

    /// The underlying array.
    #[must_use]
    pub fn as_array(&self) -> &Array3<f64> {
        &self.data
    }

    /// Sum over all pixels.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.data.sum()
    }

    /// Remaps every pixel into module coordinates.
    ///
    /// # Panics
    /// Panics if the map was built for a different geometry.
    #[must_use]
    pub fn to_module_map(&self, geometry: &ModuleGeometry) -> ModuleMap {
        let mut module = ModuleMap::new(geometry);
        for ((chip, col, row), &value) in self.data.indexed_iter() {
            // Indices are bounded by the u8-sized geometry.
            #[allow(clippy::cast_possible_truncation)]
            let coord = geometry.map_chip_to_module(chip as u8, col as u8, row as u8);
            module.data[[usize::from(coord.x), usize::from(coord.y)]] = value;
        }
        module
    }
}

/// Values per pixel in module coordinates, shape `(module_cols, module_rows)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMap {
    data: Array2<f64>,
}

impl ModuleMap {
    /// Creates a zeroed map for the given geometry.
    #[must_use]
    pub fn new(geometry: &ModuleGeometry) -> Self {
        Self {
            data: Array2::zeros((
                usize::from(geometry.module_cols()),
                usize::from(geometry.module_rows()),
            )),
        }
    }

    /// Counts one hit at its module position.
    ///
    /// Hits outside the chip geometry, including the read-out row, are not
    /// counted and return false.
    pub fn fill_hit(&mut self, geometry: &ModuleGeometry, hit: &HitRecord) -> bool {
        match geometry.try_map_chip_to_module(hit.chip, hit.col, hit.row) {
            Ok(coord) => self.fill(coord.x, coord.y, 1.0),
            Err(_) => false,
        }
    }

    /// Shape as `(module_cols, module_rows)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Value at a module position, `None` outside the map.
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<f64> {
        self.data.get([usize::from(x), usize::from(y)]).copied()
    }

    /// Adds `weight` at a module position. Returns false outside the map.
    pub fn fill(&mut self, x: u16, y: u16, weight: f64) -> bool {
        match self.data.get_mut([usize::from(x), usize::from(y)]) {
            Some(v) => {
                *v += weight;
                true
            }
            None => false,
        }
    }

    /// The underlying array.
    #[must_use]
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Sum over all pixels.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.data.sum()
    }

    /// Elementwise accumulation of another map into this one.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the maps differ in shape.
    pub fn accumulate(&mut self, other: &ModuleMap) -> Result<()> {
        if self.data.shape() != other.data.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.data.shape().to_vec(),
                found: other.data.shape().to_vec(),
            });
        }
        self.data += &other.data;
        Ok(())
    }

    /// Sums the map per `(chip, col)` by mapping every module pixel back to
    /// its read-out address. The result has shape `(n_chips, n_cols)`.
    ///
    /// # Errors
    /// Returns an error if the map was built for a different geometry.
    pub fn chip_column_totals(&self, geometry: &ModuleGeometry) -> Result<Array2<f64>> {
        let mut totals = Array2::zeros((usize::from(geometry.n_chips), usize::from(geometry.n_cols)));
        for ((x, y), &value) in self.data.indexed_iter() {
            let (x, y) = (
                u16::try_from(x).unwrap_or(u16::MAX),
                u16::try_from(y).unwrap_or(u16::MAX),
            );
            let coord = geometry.map_module_to_chip(x, y)?;
            totals[[usize::from(coord.chip), usize::from(coord.col)]] += value;
        }
        Ok(totals)
    }
}
