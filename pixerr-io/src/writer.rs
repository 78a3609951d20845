//! Writer for `PXER` event files.

use crate::format::{encode_header, encode_record};
use crate::{Error, Result};
use pixerr_core::HitRecord;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Streams hit records into a new event file.
///
/// Records must arrive sorted by event number. The entry count is only
/// known at the end and is patched into the header by [`Self::finish`].
pub struct EventFileWriter {
    writer: BufWriter<File>,
    last_event: Option<u32>,
    hits: usize,
}

impl EventFileWriter {
    /// Creates a new event file, truncating an existing one.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&encode_header(0))?;
        Ok(Self {
            writer,
            last_event: None,
            hits: 0,
        })
    }

    /// Appends one record.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the record's event number is
    /// lower than the previous one, or an I/O error.
    pub fn write_hit(&mut self, hit: &HitRecord) -> Result<()> {
        if let Some(last) = self.last_event {
            if hit.event < last {
                return Err(Error::InvalidFormat(format!(
                    "hit of event {} written after event {}",
                    hit.event, last
                )));
            }
        }
        self.writer.write_all(&encode_record(hit))?;
        self.last_event = Some(hit.event);
        self.hits += 1;
        Ok(())
    }

    /// Appends several records.
    ///
    /// # Errors
    /// See [`Self::write_hit`].
    pub fn write_hits<'a, I>(&mut self, hits: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a HitRecord>,
    {
        for hit in hits {
            self.write_hit(hit)?;
        }
        Ok(())
    }

    /// Number of records written so far.
    #[must_use]
    pub fn hits_written(&self) -> usize {
        self.hits
    }

    /// Writes the entry count into the header and flushes the file.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if `entries` is smaller than the
    /// number of distinct events implied by the last event number, or an
    /// I/O error.
    pub fn finish(mut self, entries: u64) -> Result<()> {
        if let Some(last) = self.last_event {
            if u64::from(last) >= entries {
                return Err(Error::InvalidFormat(format!(
                    "entry count {entries} does not cover event {last}"
                )));
            }
        }
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&encode_header(entries))?;
        self.writer.flush()?;
        Ok(())
    }
}
