//! On-disk memoization of expensive results.
//!
//! A [`ResultCache`] maps a structured [`CacheKey`] to one file below the
//! cache root. The first request for a key runs the producer and persists
//! the value; later requests decode the file. A readable file is always
//! considered valid: there is no freshness check. When the logic behind a
//! category changes, either bump the key version or remove the category
//! directory with [`ResultCache::clear_category`].
//!
//! A file that exists but cannot be decoded is reported as
//! [`CacheError::Corrupt`] and is not recomputed.

use crate::error::CacheError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "bin";

/// Structured identifier of a cache entry.
///
/// The file name joins the non-empty parts `name`, `campaign`, `run`
/// (zero-padded to three digits), `channel` and `suffix` with `_`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheKey {
    pub category: String,
    pub name: Option<String>,
    pub campaign: Option<String>,
    pub run: Option<u32>,
    pub channel: Option<String>,
    pub suffix: Option<String>,
    pub version: Option<u32>,
}

impl CacheKey {
    /// Creates a key in the given category (sub directory).
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Self::default()
        }
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the campaign tag.
    #[must_use]
    pub fn with_campaign(mut self, campaign: impl Into<String>) -> Self {
        self.campaign = Some(campaign.into());
        self
    }

    /// Sets the run number.
    #[must_use]
    pub fn with_run(mut self, run: u32) -> Self {
        self.run = Some(run);
        self
    }

    /// Sets the channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl ToString) -> Self {
        self.channel = Some(channel.to_string());
        self
    }

    /// Sets the suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl ToString) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    /// Sets the version tag of the category.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// File stem built from the non-empty parts.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let run = self.run.map(|r| format!("{r:03}"));
        [
            self.name.as_deref(),
            self.campaign.as_deref(),
            run.as_deref(),
            self.channel.as_deref(),
            self.suffix.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
    }

    /// Path of the entry below `root`.
    #[must_use]
    pub fn path_in(&self, root: &Path) -> PathBuf {
        let mut dir = root.join(&self.category);
        if let Some(version) = self.version {
            dir = dir.join(format!("v{version}"));
        }
        dir.join(format!("{}.{EXTENSION}", self.file_stem()))
    }
}

/// Disk-backed get-or-compute cache.
///
/// Defaults set on the cache (run, campaign, version) fill the parts a key
/// leaves unset.
#[derive(Debug, Clone)]
pub struct ResultCache {
    root: PathBuf,
    run: Option<u32>,
    campaign: Option<String>,
    version: Option<u32>,
    path: Option<PathBuf>,
}

impl ResultCache {
    /// Creates a cache rooted at `root`. Directories are created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            run: None,
            campaign: None,
            version: None,
            path: None,
        }
    }

    /// Default run number for keys without one.
    #[must_use]
    pub fn with_run(mut self, run: u32) -> Self {
        self.run = Some(run);
        self
    }

    /// Default campaign for keys without one. An empty campaign is ignored.
    #[must_use]
    pub fn with_campaign(mut self, campaign: impl Into<String>) -> Self {
        let campaign = campaign.into();
        self.campaign = (!campaign.is_empty()).then_some(campaign);
        self
    }

    /// Default category version for keys without one.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Root directory of the cache.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Selects the entry used by the next [`Self::run`] call and returns its path.
    pub fn set_path(&mut self, mut key: CacheKey) -> &Path {
        key.run = key.run.or(self.run);
        if key.campaign.is_none() {
            key.campaign.clone_from(&self.campaign);
        }
        key.version = key.version.or(self.version);
        self.path.insert(key.path_in(&self.root))
    }

    /// Path of the current entry.
    ///
    /// # Errors
    /// Returns [`CacheError::PathNotSet`] if [`Self::set_path`] was never called.
    pub fn path(&self) -> Result<&Path, CacheError> {
        match self.path.as_deref() {
            Some(path) => Ok(path),
            None => {
                log::warn!("set the cache path first");
                Err(CacheError::PathNotSet)
            }
        }
    }

    /// Returns the cached value, or runs `producer`, persists and returns its result.
    ///
    /// # Errors
    /// Returns [`CacheError::PathNotSet`] without a path, [`CacheError::Corrupt`]
    /// if the file cannot be decoded, or an I/O or encoding error.
    pub fn run<T, F>(&self, producer: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        self.try_run(|| Ok::<T, CacheError>(producer()))
    }

    /// Like [`Self::run`], but persists `value` instead when one is given.
    ///
    /// # Errors
    /// See [`Self::run`] and [`Self::store`].
    pub fn run_with<T, F>(&self, producer: F, value: Option<T>) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match value {
            Some(value) => self.store(value),
            None => self.run(producer),
        }
    }

    /// Fallible variant of [`Self::run`]; a producer error is returned as is
    /// and nothing is persisted.
    ///
    /// # Errors
    /// Returns the producer's error or any [`CacheError`] converted into `E`.
    pub fn try_run<T, E, F>(&self, producer: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.load()? {
            return Ok(value);
        }
        let value = producer()?;
        Ok(self.store(value)?)
    }

    /// Decodes the current entry if its file exists.
    ///
    /// # Errors
    /// Returns [`CacheError::PathNotSet`], [`CacheError::Corrupt`] or an I/O error.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, CacheError> {
        let path = self.path()?;
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let (value, read) =
            bincode::serde::decode_from_slice::<T, _>(&bytes, bincode::config::standard())
                .map_err(|e| corrupt(path, e.to_string()))?;
        if read != bytes.len() {
            return Err(corrupt(
                path,
                format!("{} trailing bytes", bytes.len() - read),
            ));
        }
        log::debug!("loaded {}", path.display());
        Ok(Some(value))
    }

    /// Persists `value` at the current entry and returns it.
    ///
    /// # Errors
    /// Returns [`CacheError::PathNotSet`], an encoding error or an I/O error.
    pub fn store<T: Serialize>(&self, value: T) -> Result<T, CacheError> {
        let path = self.path()?;
        let bytes = bincode::serde::encode_to_vec(&value, bincode::config::standard())
            .map_err(|e| CacheError::Encode(e.to_string()))?;
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                log::info!("creating directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(value)
    }

    /// Removes every entry of a category.
    ///
    /// # Errors
    /// Returns an I/O error if the directory exists but cannot be removed.
    pub fn clear_category(&self, category: &str) -> Result<(), CacheError> {
        let dir = self.root.join(category);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                log::info!("cleared cache category {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn corrupt(path: &Path, reason: String) -> CacheError {
    log::error!("corrupt cache file {}: {}", path.display(), reason);
    CacheError::Corrupt {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    #[test]
    fn test_file_stem_skips_empty_parts() {
        let key = CacheKey::new("PixelErrors")
            .with_name("BufferCorruption")
            .with_run(7)
            .with_suffix("");
        assert_eq!(key.file_stem(), "BufferCorruption_007");

        let full = CacheKey::new("Histos")
            .with_name("ModOccupancy")
            .with_campaign("201703")
            .with_run(123)
            .with_channel(2)
            .with_suffix("rel");
        assert_eq!(full.file_stem(), "ModOccupancy_201703_123_2_rel");
        assert_eq!(
            full.with_version(2).path_in(Path::new("/c")),
            PathBuf::from("/c/Histos/v2/ModOccupancy_201703_123_2_rel.bin")
        );
    }

    #[test]
    fn test_same_key_same_path() {
        let mut a = ResultCache::new("/tmp/x").with_run(16);
        let mut b = ResultCache::new("/tmp/x").with_run(16);
        let pa = a.set_path(CacheKey::new("ValidHits")).to_path_buf();
        let pb = b.set_path(CacheKey::new("ValidHits")).to_path_buf();
        assert_eq!(pa, pb);
        assert_eq!(pa, PathBuf::from("/tmp/x/ValidHits/016.bin"));
    }

    #[test]
    fn test_run_computes_once() {
        let dir = tempdir().unwrap();
        let mut cache = ResultCache::new(dir.path()).with_run(1);
        cache.set_path(CacheKey::new("ValidHits"));

        let calls = Cell::new(0);
        let producer = || {
            calls.set(calls.get() + 1);
            42u64
        };
        assert_eq!(cache.run(producer).unwrap(), 42);
        assert_eq!(cache.run(producer).unwrap(), 42);
        assert_eq!(calls.get(), 1);
        assert!(dir.path().join("ValidHits/001.bin").exists());
    }

    #[test]
    fn test_precomputed_value_overwrites() {
        let dir = tempdir().unwrap();
        let mut cache = ResultCache::new(dir.path());
        cache.set_path(CacheKey::new("Rates").with_name("Hit"));
        assert_eq!(cache.run(|| 1.5f64).unwrap(), 1.5);
        assert_eq!(cache.run_with(|| 0.0, Some(2.5f64)).unwrap(), 2.5);
        assert_eq!(cache.run(|| 9.0f64).unwrap(), 2.5);
    }

    #[test]
    fn test_run_without_path_is_usage_error() {
        let cache = ResultCache::new("/nonexistent");
        let result = cache.run(|| 1u32);
        assert!(matches!(result, Err(CacheError::PathNotSet)));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let mut cache = ResultCache::new(dir.path());
        let path = cache.set_path(CacheKey::new("Broken")).to_path_buf();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, [0xFFu8; 3]).unwrap();

        let result = cache.run(|| vec![1.0f64, 2.0]);
        assert!(matches!(result, Err(CacheError::Corrupt { .. })));
    }

    #[test]
    fn test_failing_producer_persists_nothing() {
        let dir = tempdir().unwrap();
        let mut cache = ResultCache::new(dir.path());
        let path = cache.set_path(CacheKey::new("Fails")).to_path_buf();
        let result: Result<u32, CacheError> = cache.try_run(|| Err(CacheError::PathNotSet));
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_category() {
        let dir = tempdir().unwrap();
        let mut cache = ResultCache::new(dir.path());
        let path = cache.set_path(CacheKey::new("Histos").with_name("A")).to_path_buf();
        cache.store(3u8).unwrap();
        assert!(path.exists());
        cache.clear_category("Histos").unwrap();
        assert!(!path.exists());
        cache.clear_category("Histos").unwrap();
    }
}
