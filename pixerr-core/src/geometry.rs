//! Readout-chip to module geometry.
//!
//! A module is tiled by readout chips (ROCs) arranged in two physical rows.
//! Chips in the bottom row keep their local orientation; chips in the top row
//! are mounted rotated by 180°, so both their column and row axes are
//! mirrored in module coordinates. The logical chip id recorded by the
//! read-out is shifted against the physical slot by a fixed wiring offset.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Columns per readout chip.
pub const N_COLS: u16 = 52;
/// Rows per readout chip.
pub const N_ROWS: u16 = 80;
/// Readout chips per module.
pub const N_CHIPS: u8 = 16;
/// Offset between logical chip id and physical slot.
pub const CHIP_OFFSET: u8 = 12;
/// Row value written by the read-out for hits without a valid pixel address.
pub const READOUT_ROW_SENTINEL: u8 = 80;

/// Pixel address on a single readout chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChipCoord {
    /// Logical chip id as recorded by the read-out.
    pub chip: u8,
    /// Column on the chip.
    pub col: u8,
    /// Row on the chip.
    pub row: u8,
}

impl ChipCoord {
    /// Creates a new chip coordinate.
    #[inline]
    #[must_use]
    pub fn new(chip: u8, col: u8, row: u8) -> Self {
        Self { chip, col, row }
    }
}

/// Pixel position in module space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleCoord {
    /// Module column.
    pub x: u16,
    /// Module row.
    pub y: u16,
}

impl ModuleCoord {
    /// Creates a new module coordinate.
    #[inline]
    #[must_use]
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Outline of one chip slot in module coordinates, in bin-edge units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChipOutline {
    /// Physical slot (0..8 bottom row, 8..16 top row).
    pub slot: u8,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChipOutline {
    /// Closed polygon through the four corners, starting at the lower left.
    #[must_use]
    pub fn polygon(&self) -> [(f64, f64); 5] {
        [
            (self.x_min, self.y_min),
            (self.x_max, self.y_min),
            (self.x_max, self.y_max),
            (self.x_min, self.y_max),
            (self.x_min, self.y_min),
        ]
    }
}

/// Geometry of a pixel module: chip size, chip count and wiring offset.
///
/// The chips always form two physical rows of `n_chips / 2` chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGeometry {
    /// Columns per chip.
    pub n_cols: u16,
    /// Rows per chip.
    pub n_rows: u16,
    /// Chips per module (must be even).
    pub n_chips: u8,
    /// Offset added to the logical chip id (modulo `n_chips`) to get the slot.
    pub chip_offset: u8,
}

impl Default for ModuleGeometry {
    fn default() -> Self {
        Self::cms_layer1()
    }
}

impl ModuleGeometry {
    /// Geometry of the CMS phase-1 layer 1 module: 16 ROCs of 52 × 80 pixels.
    #[must_use]
    pub fn cms_layer1() -> Self {
        Self {
            n_cols: N_COLS,
            n_rows: N_ROWS,
            n_chips: N_CHIPS,
            chip_offset: CHIP_OFFSET,
        }
    }

    /// Chips per physical row.
    #[inline]
    #[must_use]
    pub fn chips_per_row(&self) -> u8 {
        self.n_chips / 2
    }

    /// Number of module columns (416 for the default geometry).
    #[inline]
    #[must_use]
    pub fn module_cols(&self) -> u16 {
        self.n_cols * u16::from(self.chips_per_row())
    }

    /// Number of module rows (160 for the default geometry).
    #[inline]
    #[must_use]
    pub fn module_rows(&self) -> u16 {
        self.n_rows * 2
    }

    /// Physical slot of a logical chip id: `(chip + offset) mod n_chips`.
    #[inline]
    #[must_use]
    pub fn effective_chip(&self, chip: u8) -> u8 {
        let n = u16::from(self.n_chips);
        // Result is < n_chips, so it fits in u8.
        #[allow(clippy::cast_possible_truncation)]
        let slot = ((u16::from(chip) + u16::from(self.chip_offset)) % n) as u8;
        slot
    }

    /// Logical chip id of a physical slot (inverse of [`Self::effective_chip`]).
    #[inline]
    #[must_use]
    pub fn logical_chip(&self, slot: u8) -> u8 {
        let n = u16::from(self.n_chips);
        let offset = u16::from(self.chip_offset) % n;
        #[allow(clippy::cast_possible_truncation)]
        let chip = ((u16::from(slot) + n - offset) % n) as u8;
        chip
    }

    /// Returns true if the chip address lies inside the chip geometry.
    #[inline]
    #[must_use]
    pub fn contains(&self, chip: u8, col: u8, row: u8) -> bool {
        chip < self.n_chips && u16::from(col) < self.n_cols && u16::from(row) < self.n_rows
    }

    /// Map a chip address to module coordinates.
    ///
    /// Bottom-row slots (`slot < chips_per_row`) are shifted by
    /// `n_cols * slot`; top-row slots are rotated by 180°, mirroring both
    /// axes. The caller must pass an address inside the geometry, see
    /// [`Self::try_map_chip_to_module`] for the checked variant.
    #[inline]
    #[must_use]
    pub fn map_chip_to_module(&self, chip: u8, col: u8, row: u8) -> ModuleCoord {
        let slot = self.effective_chip(chip);
        let per_row = self.chips_per_row();
        let x_off = self.n_cols * u16::from(slot % per_row);
        let (col, row) = (u16::from(col), u16::from(row));
        if slot < per_row {
            ModuleCoord::new(col + x_off, row)
        } else {
            ModuleCoord::new(
                self.module_cols() - 1 - x_off - col,
                self.module_rows() - 1 - row,
            )
        }
    }

    /// Checked variant of [`Self::map_chip_to_module`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidCoordinate`] if the address is outside the chip.
    pub fn try_map_chip_to_module(&self, chip: u8, col: u8, row: u8) -> Result<ModuleCoord> {
        if !self.contains(chip, col, row) {
            return Err(Error::InvalidCoordinate { chip, col, row });
        }
        Ok(self.map_chip_to_module(chip, col, row))
    }

    /// Map a module coordinate back to the chip address it came from.
    ///
    /// # Errors
    /// Returns [`Error::InvalidModuleCoordinate`] if the position is outside
    /// the module.
    pub fn map_module_to_chip(&self, x: u16, y: u16) -> Result<ChipCoord> {
        if x >= self.module_cols() || y >= self.module_rows() {
            return Err(Error::InvalidModuleCoordinate { x, y });
        }
        let per_row = u16::from(self.chips_per_row());
        let (slot, col, row) = if y < self.n_rows {
            (x / self.n_cols, x % self.n_cols, y)
        } else {
            (
                2 * per_row - 1 - x / self.n_cols,
                (self.module_cols() - 1 - x) % self.n_cols,
                self.module_rows() - 1 - y,
            )
        };
        // All three values are bounded by the (u8-sized) chip geometry.
        #[allow(clippy::cast_possible_truncation)]
        let coord = ChipCoord::new(self.logical_chip(slot as u8), col as u8, row as u8);
        Ok(coord)
    }

    /// Outlines of all chip slots, bottom row first.
    #[must_use]
    pub fn chip_outlines(&self) -> Vec<ChipOutline> {
        let per_row = self.chips_per_row();
        let cols = f64::from(self.n_cols);
        let rows = f64::from(self.n_rows);
        let mut outlines = Vec::with_capacity(usize::from(self.n_chips));
        for i in 0..2u8 {
            for j in 0..per_row {
                outlines.push(ChipOutline {
                    slot: i * per_row + j,
                    x_min: cols * f64::from(j) - 0.5,
                    x_max: cols * f64::from(j + 1) - 0.5,
                    y_min: rows * f64::from(i) - 0.5,
                    y_max: rows * f64::from(i + 1) - 0.5,
                });
            }
        }
        outlines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_dimensions() {
        let geo = ModuleGeometry::default();
        assert_eq!(geo.module_cols(), 416);
        assert_eq!(geo.module_rows(), 160);
        assert_eq!(geo.chips_per_row(), 8);
    }

    #[test]
    fn test_effective_chip_offset() {
        let geo = ModuleGeometry::default();
        assert_eq!(geo.effective_chip(0), 12);
        assert_eq!(geo.effective_chip(3), 15);
        assert_eq!(geo.effective_chip(4), 0);
        assert_eq!(geo.effective_chip(11), 7);
        assert_eq!(geo.effective_chip(15), 11);
        for chip in 0..N_CHIPS {
            assert_eq!(geo.logical_chip(geo.effective_chip(chip)), chip);
        }
    }

    #[test]
    fn test_bottom_row_mapping() {
        let geo = ModuleGeometry::default();
        // chip 4 -> slot 0, no shift
        assert_eq!(geo.map_chip_to_module(4, 10, 20), ModuleCoord::new(10, 20));
        // chip 11 -> slot 7, shifted by 7 * 52
        assert_eq!(geo.map_chip_to_module(11, 0, 0), ModuleCoord::new(364, 0));
        assert_eq!(geo.map_chip_to_module(11, 51, 79), ModuleCoord::new(415, 79));
    }

    #[test]
    fn test_top_row_mapping_is_mirrored() {
        let geo = ModuleGeometry::default();
        // chip 12 -> slot 8, x_off 0: x = 415 - col, y = 159 - row
        assert_eq!(geo.map_chip_to_module(12, 0, 0), ModuleCoord::new(415, 159));
        assert_eq!(geo.map_chip_to_module(12, 51, 79), ModuleCoord::new(364, 80));
        // chip 0 -> slot 12, x_off 208
        assert_eq!(geo.map_chip_to_module(0, 5, 10), ModuleCoord::new(202, 149));
        // chip 3 -> slot 15, x_off 364
        assert_eq!(geo.map_chip_to_module(3, 51, 79), ModuleCoord::new(0, 80));
    }

    #[test]
    fn test_mapping_is_bijection() {
        let geo = ModuleGeometry::default();
        let mut seen = HashSet::new();
        for chip in 0..N_CHIPS {
            for col in 0..52u8 {
                for row in 0..80u8 {
                    let m = geo.map_chip_to_module(chip, col, row);
                    assert!(m.x < 416 && m.y < 160, "{m:?} out of module");
                    assert!(seen.insert(m), "collision at {m:?}");
                }
            }
        }
        assert_eq!(seen.len(), 416 * 160);
    }

    #[test]
    fn test_inverse_recovers_chip_address() {
        let geo = ModuleGeometry::default();
        for chip in 0..N_CHIPS {
            for col in 0..52u8 {
                for row in [0u8, 17, 79] {
                    let m = geo.map_chip_to_module(chip, col, row);
                    let back = geo.map_module_to_chip(m.x, m.y).unwrap();
                    assert_eq!(back, ChipCoord::new(chip, col, row));
                }
            }
        }
    }

    #[test]
    fn test_checked_mapping_rejects_out_of_range() {
        let geo = ModuleGeometry::default();
        assert!(geo.try_map_chip_to_module(16, 0, 0).is_err());
        assert!(geo.try_map_chip_to_module(0, 52, 0).is_err());
        assert!(geo
            .try_map_chip_to_module(0, 0, READOUT_ROW_SENTINEL)
            .is_err());
        assert!(geo.map_module_to_chip(416, 0).is_err());
        assert!(geo.map_module_to_chip(0, 160).is_err());
    }

    #[test]
    fn test_chip_outlines() {
        let geo = ModuleGeometry::default();
        let outlines = geo.chip_outlines();
        assert_eq!(outlines.len(), 16);
        assert_eq!(outlines[0].polygon()[0], (-0.5, -0.5));
        let last = outlines[15];
        assert_eq!(last.slot, 15);
        assert!((last.x_max - 415.5).abs() < f64::EPSILON);
        assert!((last.y_max - 159.5).abs() < f64::EPSILON);
    }
}
