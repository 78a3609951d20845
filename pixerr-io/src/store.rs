//! The event store query interface.
//!
//! An event store holds the hit records of one run, sorted by event number,
//! plus the total number of entries (read-out clock ticks) including the
//! entries without any hit. Analyses only read from stores.

use crate::Result;
use pixerr_core::{HitBatch, HitField, HitRecord};
use std::ops::Range;

/// Read-only access to the hits of one run.
///
/// Implementors provide the entry count and a hit scan; conditional counts,
/// projections and per-event grouping are derived from the scan.
pub trait EventStore {
    /// Total number of entries, including entries without hits.
    fn entries(&self) -> u64;

    /// Number of hit records.
    fn hit_count(&self) -> usize;

    /// Calls `f` for every hit with index in `range`, in storage order.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be read.
    fn for_each_hit(&self, range: Range<usize>, f: &mut dyn FnMut(HitRecord)) -> Result<()>;

    /// Counts the hits matching `predicate`.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be read.
    fn count_hits(&self, predicate: &dyn Fn(&HitRecord) -> bool) -> Result<u64> {
        let mut n = 0u64;
        self.for_each_hit(0..self.hit_count(), &mut |hit| {
            if predicate(&hit) {
                n += 1;
            }
        })?;
        Ok(n)
    }

    /// Copies the given fields of the hits in `range` that match `predicate`
    /// into one flat vector per field.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be read.
    fn project(
        &self,
        fields: &[HitField],
        predicate: &dyn Fn(&HitRecord) -> bool,
        range: Range<usize>,
    ) -> Result<Vec<Vec<u32>>> {
        let mut columns = vec![Vec::new(); fields.len()];
        self.for_each_hit(range, &mut |hit| {
            if predicate(&hit) {
                for (column, &field) in columns.iter_mut().zip(fields) {
                    column.push(hit.field(field));
                }
            }
        })?;
        Ok(columns)
    }

    /// Calls `f` once per event that has at least one hit, with the event
    /// number and its hits. Relies on hits being sorted by event.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be read.
    fn for_each_event(&self, f: &mut dyn FnMut(u32, &[HitRecord])) -> Result<()> {
        let mut current: Vec<HitRecord> = Vec::new();
        self.for_each_hit(0..self.hit_count(), &mut |hit| {
            if let Some(first) = current.first() {
                if first.event != hit.event {
                    f(first.event, &current);
                    current.clear();
                }
            }
            current.push(hit);
        })?;
        if let Some(first) = current.first() {
            f(first.event, &current);
        }
        Ok(())
    }

    /// Counts the events (with at least one hit) whose hits match `predicate`.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be read.
    fn count_events(&self, predicate: &dyn Fn(&[HitRecord]) -> bool) -> Result<u64> {
        let mut n = 0u64;
        self.for_each_event(&mut |_, hits| {
            if predicate(hits) {
                n += 1;
            }
        })?;
        Ok(n)
    }
}

/// An event store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    entries: u64,
    hits: HitBatch,
}

impl MemoryEventStore {
    /// Creates a store from records in any order; they are sorted by event.
    #[must_use]
    pub fn from_records(entries: u64, mut records: Vec<HitRecord>) -> Self {
        records.sort_by_key(|hit| hit.event);
        Self {
            entries,
            hits: records.into_iter().collect(),
        }
    }

    /// The stored hits.
    #[must_use]
    pub fn hits(&self) -> &HitBatch {
        &self.hits
    }
}

impl EventStore for MemoryEventStore {
    fn entries(&self) -> u64 {
        self.entries
    }

    fn hit_count(&self) -> usize {
        self.hits.len()
    }

    fn for_each_hit(&self, range: Range<usize>, f: &mut dyn FnMut(HitRecord)) -> Result<()> {
        let end = range.end.min(self.hits.len());
        for i in range.start.min(end)..end {
            f(self.hits.get(i));
        }
        Ok(())
    }

    fn project(
        &self,
        fields: &[HitField],
        predicate: &dyn Fn(&HitRecord) -> bool,
        range: Range<usize>,
    ) -> Result<Vec<Vec<u32>>> {
        // Columnar fast path when every hit in range is selected.
        let end = range.end.min(self.hits.len());
        let start = range.start.min(end);
        if (start..end).all(|i| predicate(&self.hits.get(i))) {
            return Ok(fields
                .iter()
                .map(|&field| self.hits.project(field, start..end))
                .collect());
        }
        let mut columns = vec![Vec::new(); fields.len()];
        for hit in (start..end).map(|i| self.hits.get(i)).filter(|h| predicate(h)) {
            for (column, &field) in columns.iter_mut().zip(fields) {
                column.push(hit.field(field));
            }
        }
        Ok(columns)
    }
}
