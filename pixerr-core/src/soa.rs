//! Structure of Arrays (`SoA`) storage for hit records.
//!
//! `HitBatch` keeps every hit field in its own vector. Field projections
//! and conditional counts then walk a single column instead of striding
//! over whole records.

use crate::hit::{HitField, HitRecord};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A batch of hits stored in Structure of Arrays (`SoA`) format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitBatch {
    /// Event number per hit.
    pub event: Vec<u32>,
    /// Logical chip id per hit.
    pub chip: Vec<u8>,
    /// Chip column per hit.
    pub col: Vec<u8>,
    /// Chip row per hit.
    pub row: Vec<u8>,
    /// Buffer corruption flag per hit.
    pub buffer_corruption: Vec<u8>,
    /// Invalid address flag per hit.
    pub invalid_address: Vec<u8>,
    /// Invalid pulse height flag per hit.
    pub invalid_pulse_height: Vec<u8>,
}

impl HitBatch {
    /// Creates a new empty batch with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            event: Vec::with_capacity(capacity),
            chip: Vec::with_capacity(capacity),
            col: Vec::with_capacity(capacity),
            row: Vec::with_capacity(capacity),
            buffer_corruption: Vec::with_capacity(capacity),
            invalid_address: Vec::with_capacity(capacity),
            invalid_pulse_height: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of hits in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.event.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event.is_empty()
    }

    /// Pushes a single hit into the batch.
    pub fn push(&mut self, hit: HitRecord) {
        self.event.push(hit.event);
        self.chip.push(hit.chip);
        self.col.push(hit.col);
        self.row.push(hit.row);
        self.buffer_corruption.push(hit.buffer_corruption);
        self.invalid_address.push(hit.invalid_address);
        self.invalid_pulse_height.push(hit.invalid_pulse_height);
    }

    /// Reassembles the hit at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> HitRecord {
        HitRecord {
            event: self.event[index],
            chip: self.chip[index],
            col: self.col[index],
            row: self.row[index],
            buffer_corruption: self.buffer_corruption[index],
            invalid_address: self.invalid_address[index],
            invalid_pulse_height: self.invalid_pulse_height[index],
        }
    }

    /// Copies one field of the hits in `range` into a flat vector.
    ///
    /// The range is clamped to the batch length.
    #[must_use]
    pub fn project(&self, field: HitField, range: Range<usize>) -> Vec<u32> {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let widen = |v: &[u8]| -> Vec<u32> { v[start..end].iter().copied().map(u32::from).collect() };
        match field {
            HitField::Event => self.event[start..end].to_vec(),
            HitField::Chip => widen(&self.chip),
            HitField::Col => widen(&self.col),
            HitField::Row => widen(&self.row),
            HitField::BufferCorruption => widen(&self.buffer_corruption),
            HitField::InvalidAddress => widen(&self.invalid_address),
            HitField::InvalidPulseHeight => widen(&self.invalid_pulse_height),
        }
    }
}

impl FromIterator<HitRecord> for HitBatch {
    fn from_iter<I: IntoIterator<Item = HitRecord>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = HitBatch::with_capacity(iter.size_hint().0);
        for hit in iter {
            batch.push(hit);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::ErrorKind;

    #[test]
    fn test_hit_batch_operations() {
        let mut batch = HitBatch::with_capacity(10);
        assert!(batch.is_empty());

        batch.push(HitRecord::new(0, 1, 10, 20));
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.col[0], 10);

        batch.push(HitRecord::new(1, 2, 11, 21).with_error(ErrorKind::BufferCorruption, 1));
        assert_eq!(batch.len(), 2);
        assert!(batch.get(1).is_corrupted());
        assert_eq!(batch.get(0), HitRecord::new(0, 1, 10, 20));
    }

    #[test]
    fn test_projection_clamps_range() {
        let batch: HitBatch = (0..5).map(|i| HitRecord::new(i, 0, 3, 4)).collect();
        assert_eq!(batch.project(HitField::Event, 1..3), vec![1, 2]);
        assert_eq!(batch.project(HitField::Col, 3..100), vec![3, 3]);
        assert!(batch.project(HitField::Row, 10..20).is_empty());
    }
}
