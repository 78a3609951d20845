//! Run discovery in the data directory.
//!
//! Every run is backed by one file named `run<NNN>-<HV>-<CURRENT>.<ext>`,
//! e.g. `run016-500-20.pxer` for run 16 at 500 kV and 20 mA.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Operating conditions and backing file of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub run: u32,
    /// Bias voltage in kV.
    pub voltage: i32,
    /// Tube current in mA.
    pub current: i32,
    pub path: PathBuf,
}

/// Parses `run<NNN>-<HV>-<CURRENT>.<ext>` into `(run, voltage, current)`.
///
/// Returns `None` for anything else.
#[must_use]
pub fn parse_run_file_name(name: &str) -> Option<(u32, i32, i32)> {
    let mut parts = name.split('-');
    let run = parts.next()?.strip_prefix("run")?;
    let voltage = parts.next()?;
    let current = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let (current, ext) = current.split_once('.')?;
    if ext.is_empty() || !run.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((run.parse().ok()?, voltage.parse().ok()?, current.parse().ok()?))
}

/// Runs found in a data directory, ordered by run number.
#[derive(Debug, Clone, Default)]
pub struct RunCatalog {
    dir: PathBuf,
    runs: BTreeMap<u32, RunInfo>,
}

impl RunCatalog {
    /// Scans `dir` for run files. Files with other names are skipped.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read.
    pub fn scan<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut runs = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some((run, voltage, current)) = parse_run_file_name(name) {
                runs.insert(
                    run,
                    RunInfo {
                        run,
                        voltage,
                        current,
                        path,
                    },
                );
            }
        }
        log::debug!("found {} runs in {}", runs.len(), dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            runs,
        })
    }

    /// Builds a catalog from known runs without touching the file system.
    #[must_use]
    pub fn from_runs(dir: impl Into<PathBuf>, runs: impl IntoIterator<Item = RunInfo>) -> Self {
        Self {
            dir: dir.into(),
            runs: runs.into_iter().map(|info| (info.run, info)).collect(),
        }
    }

    /// The scanned directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn get(&self, run: u32) -> Option<&RunInfo> {
        self.runs.get(&run)
    }

    #[must_use]
    pub fn contains(&self, run: u32) -> bool {
        self.runs.contains_key(&run)
    }

    /// Looks up the backing file of a run.
    ///
    /// # Errors
    /// Returns [`Error::RunNotFound`] if the run is not in the catalog.
    pub fn locate(&self, run: u32) -> Result<&RunInfo> {
        self.runs.get(&run).ok_or_else(|| Error::RunNotFound {
            run,
            dir: self.dir.clone(),
        })
    }

    /// Run numbers in ascending order.
    pub fn runs(&self) -> impl Iterator<Item = u32> + '_ {
        self.runs.keys().copied()
    }

    /// Run infos in ascending run order.
    pub fn iter(&self) -> impl Iterator<Item = &RunInfo> {
        self.runs.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_run_file_name() {
        assert_eq!(parse_run_file_name("run016-500-20.pxer"), Some((16, 500, 20)));
        assert_eq!(parse_run_file_name("run1-0-0.root"), Some((1, 0, 0)));
        assert_eq!(parse_run_file_name("run016-500-20"), None);
        assert_eq!(parse_run_file_name("runx-500-20.pxer"), None);
        assert_eq!(parse_run_file_name("run016-500.pxer"), None);
        assert_eq!(parse_run_file_name("run016-5a0-20.pxer"), None);
        assert_eq!(parse_run_file_name("run016-500-20-1.pxer"), None);
        assert_eq!(parse_run_file_name("notes.txt"), None);
    }

    #[test]
    fn test_scan_orders_runs_and_skips_junk() {
        let dir = tempdir().unwrap();
        for name in ["run010-400-5.pxer", "run002-300-10.pxer", "README", "run3.pxer"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let catalog = RunCatalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.runs().collect::<Vec<_>>(), vec![2, 10]);
        let info = catalog.get(2).unwrap();
        assert_eq!((info.voltage, info.current), (300, 10));
        assert!(info.path.ends_with("run002-300-10.pxer"));
    }

    #[test]
    fn test_locate_unknown_run() {
        let catalog = RunCatalog::from_runs("/data", []);
        assert!(catalog.is_empty());
        assert!(matches!(
            catalog.locate(7),
            Err(Error::RunNotFound { run: 7, .. })
        ));
    }
}
