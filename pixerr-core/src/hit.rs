//! Hit records and their named fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single pixel hit as stored by the read-out.
///
/// The three error fields are small counters; zero means the hit is clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HitRecord {
    /// Event (trigger) number the hit belongs to.
    pub event: u32,
    /// Logical readout chip id.
    pub chip: u8,
    /// Column on the chip.
    pub col: u8,
    /// Row on the chip.
    pub row: u8,
    /// Buffer corruption flag.
    pub buffer_corruption: u8,
    /// Invalid address flag.
    pub invalid_address: u8,
    /// Invalid pulse height flag.
    pub invalid_pulse_height: u8,
}

impl HitRecord {
    /// Creates a clean hit.
    #[inline]
    #[must_use]
    pub fn new(event: u32, chip: u8, col: u8, row: u8) -> Self {
        Self {
            event,
            chip,
            col,
            row,
            ..Self::default()
        }
    }

    /// Sets the value of one error field.
    #[must_use]
    pub fn with_error(mut self, kind: ErrorKind, value: u8) -> Self {
        match kind {
            ErrorKind::BufferCorruption => self.buffer_corruption = value,
            ErrorKind::InvalidAddress => self.invalid_address = value,
            ErrorKind::InvalidPulseHeight => self.invalid_pulse_height = value,
        }
        self
    }

    /// Returns true if the buffer corruption flag is set.
    #[inline]
    #[must_use]
    pub fn is_corrupted(&self) -> bool {
        self.buffer_corruption >= 1
    }

    /// Value of a named field, widened to `u32`.
    #[inline]
    #[must_use]
    pub fn field(&self, field: HitField) -> u32 {
        match field {
            HitField::Event => self.event,
            HitField::Chip => u32::from(self.chip),
            HitField::Col => u32::from(self.col),
            HitField::Row => u32::from(self.row),
            HitField::BufferCorruption => u32::from(self.buffer_corruption),
            HitField::InvalidAddress => u32::from(self.invalid_address),
            HitField::InvalidPulseHeight => u32::from(self.invalid_pulse_height),
        }
    }

    /// Value of an error field.
    #[inline]
    #[must_use]
    pub fn error(&self, kind: ErrorKind) -> u32 {
        self.field(kind.field())
    }
}

/// Named numeric fields of a hit record, used for projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitField {
    Event,
    Chip,
    Col,
    Row,
    BufferCorruption,
    InvalidAddress,
    InvalidPulseHeight,
}

impl HitField {
    /// Field name as written in the event files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Chip => "plane",
            Self::Col => "col",
            Self::Row => "row",
            Self::BufferCorruption => "buffer_corruption",
            Self::InvalidAddress => "invalid_address",
            Self::InvalidPulseHeight => "invalid_pulse_height",
        }
    }
}

/// The read-out error categories tracked per hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    BufferCorruption,
    InvalidAddress,
    InvalidPulseHeight,
}

impl ErrorKind {
    /// All error kinds in display order.
    pub const ALL: [ErrorKind; 3] = [
        Self::BufferCorruption,
        Self::InvalidAddress,
        Self::InvalidPulseHeight,
    ];

    /// The hit field carrying this error.
    #[must_use]
    pub fn field(self) -> HitField {
        match self {
            Self::BufferCorruption => HitField::BufferCorruption,
            Self::InvalidAddress => HitField::InvalidAddress,
            Self::InvalidPulseHeight => HitField::InvalidPulseHeight,
        }
    }

    /// Capitalised name used for cache entries, e.g. `BufferCorruption`.
    #[must_use]
    pub fn cache_name(self) -> &'static str {
        match self {
            Self::BufferCorruption => "BufferCorruption",
            Self::InvalidAddress => "InvalidAddress",
            Self::InvalidPulseHeight => "InvalidPulseHeight",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BufferCorruption => "buffer corruption",
            Self::InvalidAddress => "invalid address",
            Self::InvalidPulseHeight => "invalid pulse height",
        };
        f.write_str(label)
    }
}
