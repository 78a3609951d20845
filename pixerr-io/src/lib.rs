//! pixerr-io: Event stores, run catalog and result cache for pixerr.
//!
//! This crate provides the [`EventStore`] query interface with an in-memory
//! and a memory-mapped file implementation, the writer for the binary event
//! file format, the on-disk [`ResultCache`] used to memoize expensive scans,
//! and the [`RunCatalog`] built from the data directory.
//!

pub mod cache;
pub mod catalog;
mod error;
mod format;
mod reader;
pub mod store;
mod writer;

pub use cache::{CacheKey, ResultCache};
pub use catalog::{parse_run_file_name, RunCatalog, RunInfo};
pub use error::{CacheError, Error, Result};
pub use reader::{EventFileReader, MappedFileReader};
pub use store::{EventStore, MemoryEventStore};
pub use writer::EventFileWriter;
