//! Memory-mapped event file readers.
//!

use crate::format::{decode_header, decode_record, HEADER_LEN, RECORD_LEN};
use crate::store::EventStore;
use crate::{Error, Result};
use memmap2::Mmap;
use pixerr_core::HitRecord;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// The mapping is released when the reader is dropped.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path of the mapped file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reader for `PXER` event files, usable as an [`EventStore`].
pub struct EventFileReader {
    reader: MappedFileReader,
    entries: u64,
}

impl EventFileReader {
    /// Opens and validates an event file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be mapped, the header is invalid,
    /// the record section is not a whole number of records, or the records
    /// are not sorted by event number within `[0, entries)`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        let entries = decode_header(reader.as_bytes())?;
        let body = reader.len() - HEADER_LEN;
        if body % RECORD_LEN != 0 {
            return Err(Error::InvalidFormat(format!(
                "record section of {} bytes is not a multiple of {} (file: {})",
                body,
                RECORD_LEN,
                reader.path().display()
            )));
        }
        check_records(&reader.as_bytes()[HEADER_LEN..], entries).map_err(|msg| {
            Error::InvalidFormat(format!("{msg} (file: {})", reader.path().display()))
        })?;
        log::debug!(
            "opened {} with {} entries and {} hits",
            reader.path().display(),
            entries,
            body / RECORD_LEN
        );
        Ok(Self { reader, entries })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Iterates over the records with index in `range`.
    pub fn records(&self, range: Range<usize>) -> impl Iterator<Item = HitRecord> + '_ {
        let end = range.end.min(self.hit_count());
        let start = range.start.min(end);
        self.reader.as_bytes()[HEADER_LEN + start * RECORD_LEN..HEADER_LEN + end * RECORD_LEN]
            .chunks_exact(RECORD_LEN)
            .map(decode_record)
    }

}

/// Per-event grouping walks the records in storage order, so event numbers
/// must never decrease and must stay below the entry count.
fn check_records(body: &[u8], entries: u64) -> std::result::Result<(), String> {
    let mut previous = 0u32;
    for (index, chunk) in body.chunks_exact(RECORD_LEN).enumerate() {
        let event = decode_record(chunk).event;
        if event < previous {
            return Err(format!(
                "record {index}: event {event} follows event {previous}, records must be sorted by event"
            ));
        }
        if u64::from(event) >= entries {
            return Err(format!(
                "record {index}: event {event} is outside the {entries} entries of the run"
            ));
        }
        previous = event;
    }
    Ok(())
}

impl EventStore for EventFileReader {
    fn entries(&self) -> u64 {
        self.entries
    }

    fn hit_count(&self) -> usize {
        (self.reader.len() - HEADER_LEN) / RECORD_LEN
    }

    fn for_each_hit(&self, range: Range<usize>, f: &mut dyn FnMut(HitRecord)) -> Result<()> {
        for hit in self.records(range) {
            f(hit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{encode_header, encode_record};
    use pixerr_core::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn raw_event_file(entries: u64, hits: &[HitRecord]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encode_header(entries)).unwrap();
        for hit in hits {
            file.write_all(&encode_record(hit)).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_mapped_file_reader() {
        let mut file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..64).collect();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let reader = MappedFileReader::open(file.path()).unwrap();
        assert_eq!(reader.len(), 64);
        assert!(!reader.is_empty());
        assert_eq!(reader.as_bytes(), &data[..]);
    }

    #[test]
    fn test_event_file_without_hits() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encode_header(42)).unwrap();
        file.flush().unwrap();

        let reader = EventFileReader::open(file.path()).unwrap();
        assert_eq!(reader.entries(), 42);
        assert_eq!(reader.hit_count(), 0);
        assert_eq!(reader.records(0..10).count(), 0);
    }

    #[test]
    fn test_event_file_invalid_size() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encode_header(1)).unwrap();
        file.write_all(&[0u8; 7]).unwrap(); // Not a whole record
        file.flush().unwrap();

        assert!(matches!(
            EventFileReader::open(file.path()),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_event_file_truncated_header() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"PXER").unwrap();
        file.flush().unwrap();

        assert!(EventFileReader::open(file.path()).is_err());
    }

    #[test]
    fn test_event_file_groups_sorted_events() {
        let file = raw_event_file(
            10,
            &[
                HitRecord::new(0, 0, 0, 0),
                HitRecord::new(0, 1, 0, 0).with_error(ErrorKind::BufferCorruption, 1),
                HitRecord::new(1, 0, 0, 0),
                HitRecord::new(9, 0, 0, 0),
            ],
        );
        let reader = EventFileReader::open(file.path()).unwrap();
        let clean = reader
            .count_events(&|hits| hits.iter().all(|h| !h.is_corrupted()))
            .unwrap();
        assert_eq!(clean, 2);
    }

    #[test]
    fn test_event_file_unsorted_events() {
        // event 0 reappears after event 1 and would be split in two groups
        let file = raw_event_file(
            10,
            &[
                HitRecord::new(0, 0, 0, 0),
                HitRecord::new(1, 0, 0, 0),
                HitRecord::new(0, 0, 0, 0).with_error(ErrorKind::BufferCorruption, 1),
            ],
        );
        assert!(matches!(
            EventFileReader::open(file.path()),
            Err(Error::InvalidFormat(msg)) if msg.contains("sorted")
        ));
    }

    #[test]
    fn test_event_file_event_beyond_entries() {
        let file = raw_event_file(10, &[HitRecord::new(3, 0, 0, 0), HitRecord::new(10, 0, 0, 0)]);
        assert!(matches!(
            EventFileReader::open(file.path()),
            Err(Error::InvalidFormat(msg)) if msg.contains("outside")
        ));
    }
}
