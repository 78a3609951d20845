//! Per-run read-out error analysis.
//!
//! An [`ErrorAnalyser`] owns the event store of one run and its own result
//! cache. Every expensive scan is cached under a category of the cache root:
//!
//! | quantity            | category / name                |
//! |---------------------|--------------------------------|
//! | valid hits          | `ValidHits`                    |
//! | valid events        | `ValidEvents`                  |
//! | error totals        | `PixelErrors/<ErrorKind>`      |
//! | module occupancy    | `Histos/ModOccupancy`          |
//! | chip occupancy      | `Histos/ChipOccupancy`         |
//! | buffer maps         | `Histos/BufErrorsAbs`, `BufErrorsRel` |
//! | event size          | `Histos/EventSize`             |

use crate::config::AnalysisConfig;
use crate::draw::DrawContext;
use crate::plot::{Plot, PlotData, PlotSink};
use crate::{AnalysisError, Result};
use ndarray::{Array2, Zip};
use pixerr_core::stats::{self, fit_poisson};
use pixerr_core::{
    ChipMap, ChipOutline, ErrorKind, Histogram1D, ModuleGeometry, ModuleMap, PoissonFit,
    PoissonSeed, Profile1D,
};
use pixerr_io::{CacheKey, EventFileReader, EventStore, ResultCache, RunCatalog, RunInfo};
use serde::de::DeserializeOwned;
use serde::Serialize;

const EVENT_SIZE_BINS: usize = 100;
const ENTRIES_PER_TIME_BIN: u64 = 5000;
const DISPLAY_MARGIN_BINS: usize = 3;

/// Statistics, maps and plots of one run.
pub struct ErrorAnalyser<S: EventStore = EventFileReader> {
    info: RunInfo,
    store: S,
    cache: ResultCache,
    geometry: ModuleGeometry,
    module_name: String,
    run_duration_min: u32,
}

impl ErrorAnalyser<EventFileReader> {
    /// Opens the event file of `run`.
    ///
    /// # Errors
    /// Returns [`AnalysisError::RunNotFound`] if the catalog has no file for
    /// the run or the file is gone, or an I/O error if it cannot be opened.
    pub fn open(config: &AnalysisConfig, catalog: &RunCatalog, run: u32) -> Result<Self> {
        let info = catalog.locate(run)?.clone();
        let store = EventFileReader::open(&info.path).map_err(|e| match e {
            pixerr_io::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                AnalysisError::RunNotFound {
                    run,
                    dir: catalog.dir().to_path_buf(),
                }
            }
            other => other.into(),
        })?;
        let cache = ResultCache::new(&config.cache_dir)
            .with_campaign(config.campaign.clone())
            .with_version(config.cache_version);
        Ok(Self::new(info, store, cache)
            .with_module_name(config.module_name.clone())
            .with_run_duration(config.run_duration_min))
    }
}

impl<S: EventStore> ErrorAnalyser<S> {
    /// Creates an analyser over an already opened store. The cache gets the
    /// run number as default key part.
    #[must_use]
    pub fn new(info: RunInfo, store: S, cache: ResultCache) -> Self {
        let defaults = AnalysisConfig::default();
        Self {
            cache: cache.with_run(info.run),
            info,
            store,
            geometry: ModuleGeometry::default(),
            module_name: defaults.module_name,
            run_duration_min: defaults.run_duration_min,
        }
    }

    #[must_use]
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    #[must_use]
    pub fn with_run_duration(mut self, minutes: u32) -> Self {
        self.run_duration_min = minutes;
        self
    }

    #[must_use]
    pub fn run(&self) -> u32 {
        self.info.run
    }

    #[must_use]
    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    /// Number of entries (read-out clock ticks) of the run.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.store.entries()
    }

    #[must_use]
    pub fn geometry(&self) -> &ModuleGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Output sub directory for plots of this run.
    #[must_use]
    pub fn save_dir(&self) -> String {
        format!("{:03}", self.info.run)
    }

    fn cached<T, F>(&self, key: CacheKey, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let mut cache = self.cache.clone();
        cache.set_path(key);
        cache.try_run(producer)
    }

    fn all_hits(&self) -> std::ops::Range<usize> {
        0..self.store.hit_count()
    }

    /// Number of hits without buffer corruption.
    ///
    /// # Errors
    /// Returns a cache or store error.
    pub fn valid_hits(&self) -> Result<u64> {
        self.cached(CacheKey::new("ValidHits"), || {
            log::info!("Getting valid hits for run {} ...", self.run());
            Ok(self.store.count_hits(&|hit| !hit.is_corrupted())?)
        })
    }

    /// Number of events with at least one hit and no corrupted hit.
    ///
    /// # Errors
    /// Returns a cache or store error.
    pub fn valid_events(&self) -> Result<u64> {
        self.cached(CacheKey::new("ValidEvents"), || {
            log::info!("Getting valid events for run {} ...", self.run());
            Ok(self
                .store
                .count_events(&|hits| !hits.is_empty() && hits.iter().all(|h| !h.is_corrupted()))?)
        })
    }

    /// Valid hit rate in Hz.
    ///
    /// # Errors
    /// See [`Self::valid_hits`].
    pub fn hit_rate(&self) -> Result<f64> {
        Ok(stats::rate_hz(self.valid_hits()?, self.entries()))
    }

    /// Hit rate as `"{:5.1} MHz"`.
    ///
    /// # Errors
    /// See [`Self::valid_hits`].
    pub fn hit_rate_string(&self) -> Result<String> {
        Ok(stats::format_mhz(self.hit_rate()?, 1))
    }

    /// Valid event rate in Hz.
    ///
    /// # Errors
    /// See [`Self::valid_events`].
    pub fn event_rate(&self) -> Result<f64> {
        Ok(stats::rate_hz(self.valid_events()?, self.entries()))
    }

    /// Event rate as `"{:5.4} MHz"`.
    ///
    /// # Errors
    /// See [`Self::valid_events`].
    pub fn event_rate_string(&self) -> Result<String> {
        Ok(stats::format_mhz(self.event_rate()?, 4))
    }

    /// Sum of an error field over all hits where it is set.
    ///
    /// # Errors
    /// Returns a cache or store error.
    pub fn pixel_errors(&self, kind: ErrorKind) -> Result<u64> {
        let key = CacheKey::new("PixelErrors").with_name(kind.cache_name());
        self.cached(key, || {
            log::info!("Getting {kind}s for run {} ...", self.run());
            let mut total = 0u64;
            self.store.for_each_hit(self.all_hits(), &mut |hit| {
                total += u64::from(hit.error(kind));
            })?;
            Ok(total)
        })
    }

    /// # Errors
    /// See [`Self::pixel_errors`].
    pub fn buffer_errors(&self) -> Result<u64> {
        self.pixel_errors(ErrorKind::BufferCorruption)
    }

    /// # Errors
    /// See [`Self::pixel_errors`].
    pub fn invalid_addresses(&self) -> Result<u64> {
        self.pixel_errors(ErrorKind::InvalidAddress)
    }

    /// # Errors
    /// See [`Self::pixel_errors`].
    pub fn invalid_pulse_heights(&self) -> Result<u64> {
        self.pixel_errors(ErrorKind::InvalidPulseHeight)
    }

    /// Buffer errors in percent of the valid hits, 0 without valid hits.
    ///
    /// # Errors
    /// Returns a cache or store error.
    #[allow(clippy::cast_precision_loss)]
    pub fn buffer_proportion(&self) -> Result<f64> {
        Ok(stats::buffer_proportion(
            self.buffer_errors()? as f64,
            self.valid_hits()?,
        ))
    }

    /// Hit counts per module pixel.
    ///
    /// Hits outside the chip geometry, including the read-out row 80, are
    /// skipped and counted in a warning.
    ///
    /// # Errors
    /// Returns a cache or store error.
    pub fn module_occupancy(&self) -> Result<ModuleMap> {
        self.cached(CacheKey::new("Histos").with_name("ModOccupancy"), || {
            log::info!("Filling module occupancy for run {} ...", self.run());
            let geometry = self.geometry;
            let mut map = ModuleMap::new(&geometry);
            let mut skipped = 0usize;
            self.store.for_each_hit(self.all_hits(), &mut |hit| {
                if !map.fill_hit(&geometry, &hit) {
                    skipped += 1;
                }
            })?;
            if skipped > 0 {
                log::warn!("{skipped} hits outside the chip geometry in run {}", self.run());
            }
            Ok(map)
        })
    }

    /// Hit counts per pixel in read-out addressing.
    ///
    /// # Errors
    /// Returns a cache or store error.
    pub fn chip_map(&self) -> Result<ChipMap> {
        self.cached(CacheKey::new("Histos").with_name("ChipOccupancy"), || {
            let mut map = ChipMap::new(&self.geometry);
            self.store.for_each_hit(self.all_hits(), &mut |hit| {
                map.fill_hit(&hit);
            })?;
            Ok(map)
        })
    }

    /// Hit counts of one chip, shape `(n_cols, n_rows)`.
    ///
    /// # Errors
    /// Returns [`pixerr_core::Error::InvalidCoordinate`] for an unknown chip,
    /// or a cache or store error.
    pub fn chip_occupancy(&self, chip: u8) -> Result<Array2<f64>> {
        if chip >= self.geometry.n_chips {
            return Err(pixerr_core::Error::InvalidCoordinate { chip, col: 0, row: 0 }.into());
        }
        Ok(self.chip_map()?.chip(chip).to_owned())
    }

    /// Buffer corruptions per chip column, spread over all rows of the
    /// column and mapped onto the module.
    ///
    /// With `rel` the value is the corrupted share of all hits in the
    /// column in per mille, where the hit totals come from the module
    /// occupancy mapped back to read-out addressing. Columns without hits
    /// are 0.
    ///
    /// # Errors
    /// Returns a cache or store error.
    pub fn buffer_map(&self, rel: bool) -> Result<ModuleMap> {
        let name = if rel { "BufErrorsRel" } else { "BufErrorsAbs" };
        self.cached(CacheKey::new("Histos").with_name(name), || {
            log::info!("Filling buffer map for run {}", self.run());
            let geometry = self.geometry;
            let mut bad = Array2::<f64>::zeros((
                usize::from(geometry.n_chips),
                usize::from(geometry.n_cols),
            ));
            let mut out_of_range = 0usize;
            self.store.for_each_hit(self.all_hits(), &mut |hit| {
                if !hit.is_corrupted() {
                    return;
                }
                match bad.get_mut([usize::from(hit.chip), usize::from(hit.col)]) {
                    Some(count) => *count += 1.0,
                    None => out_of_range += 1,
                }
            })?;
            if out_of_range > 0 {
                log::warn!("Column out of range for {out_of_range} corrupted hits in run {}", self.run());
            }
            let values = if rel {
                let good = self.module_occupancy()?.chip_column_totals(&geometry)?;
                Zip::from(&bad)
                    .and(&good)
                    .map_collect(|&b, &g| stats::per_mille(b, g))
            } else {
                bad
            };
            Ok(ChipMap::broadcast_columns(&geometry, &values)?.to_module_map(&geometry))
        })
    }

    /// Distribution of hits per entry over `[0, 100)`; entries without hits
    /// count as size 0.
    ///
    /// # Errors
    /// Returns a cache or store error.
    #[allow(clippy::cast_precision_loss)]
    pub fn event_size(&self) -> Result<Histogram1D> {
        self.cached(CacheKey::new("Histos").with_name("EventSize"), || {
            let mut hist = Histogram1D::new(EVENT_SIZE_BINS, 0.0, EVENT_SIZE_BINS as f64)?;
            let mut events_with_hits = 0u64;
            self.store.for_each_event(&mut |_, hits| {
                events_with_hits += 1;
                hist.fill(hits.len() as f64, 1.0);
            })?;
            hist.fill(0.0, self.entries().saturating_sub(events_with_hits) as f64);
            Ok(hist)
        })
    }

    /// Poisson fit of the event size, seeded with `C = 1e7`, `lambda = 5`.
    ///
    /// # Errors
    /// Returns [`pixerr_core::Error::EmptyHistogram`] for a run without
    /// entries, or a cache or store error.
    pub fn event_size_fit(&self) -> Result<PoissonFit> {
        Ok(fit_poisson(&self.event_size()?, PoissonSeed::default())?)
    }

    /// Mean buffer corruption in per mille versus event number, one bin per
    /// 5000 entries.
    ///
    /// # Errors
    /// Returns a store error.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn time_profile(&self) -> Result<Profile1D> {
        let entries = self.entries().max(1);
        let bins = (entries / ENTRIES_PER_TIME_BIN).max(1) as usize;
        let mut profile = Profile1D::new(bins, 0.0, entries as f64)?;
        self.store.for_each_hit(self.all_hits(), &mut |hit| {
            profile.fill(f64::from(hit.event), f64::from(hit.buffer_corruption) * 1000.0);
        })?;
        Ok(profile)
    }

    /// Chip outlines for map overlays.
    #[must_use]
    pub fn module_grid(&self) -> Vec<ChipOutline> {
        self.geometry.chip_outlines()
    }

    /// Run info legend lines.
    ///
    /// # Errors
    /// See [`Self::hit_rate`].
    pub fn run_info_lines(&self) -> Result<Vec<String>> {
        Ok(vec![
            format!(
                "Run {}: {}, {} Min ({} evts)",
                self.run(),
                self.hit_rate_string()?,
                self.run_duration_min,
                self.entries()
            ),
            format!(
                "Module: {} @ {}kV and {}mA",
                self.module_name, self.info.voltage, self.info.current
            ),
        ])
    }

    /// # Errors
    /// Returns an analysis or draw error.
    pub fn draw_occupancy<P: PlotSink>(&self, ctx: &mut DrawContext<P>, chip: u8) -> Result<()> {
        let plot = Plot::new(
            format!("occupancy_roc{chip}"),
            format!("Occupancy ROC {chip}"),
            PlotData::Map {
                values: self.chip_occupancy(chip)?,
                grid: Vec::new(),
            },
        )
        .with_axes("col", "row")
        .with_z_title("Number of Entries")
        .with_info(self.run_info_lines()?);
        Ok(ctx.draw(plot)?)
    }

    /// # Errors
    /// Returns an analysis or draw error.
    pub fn draw_module_occupancy<P: PlotSink>(&self, ctx: &mut DrawContext<P>) -> Result<ModuleMap> {
        let map = self.module_occupancy()?;
        self.draw_module_map(ctx, "module_occupancy", "Module Occupancy", "Number of Entries", &map)?;
        Ok(map)
    }

    /// # Errors
    /// Returns an analysis or draw error.
    pub fn draw_buffer_map<P: PlotSink>(&self, ctx: &mut DrawContext<P>, rel: bool) -> Result<ModuleMap> {
        let map = self.buffer_map(rel)?;
        let (name, z_title) = if rel {
            ("buffer_map_rel", "Buffer Errors [per mill]")
        } else {
            ("buffer_map_abs", "Number of Errors")
        };
        self.draw_module_map(ctx, name, "Buffer Corruptions", z_title, &map)?;
        Ok(map)
    }

    fn draw_module_map<P: PlotSink>(
        &self,
        ctx: &mut DrawContext<P>,
        name: &str,
        title: &str,
        z_title: &str,
        map: &ModuleMap,
    ) -> Result<()> {
        let plot = Plot::new(
            name,
            title,
            PlotData::Map {
                values: map.as_array().clone(),
                grid: self.module_grid(),
            },
        )
        .with_axes("col", "row")
        .with_z_title(z_title)
        .with_info(self.run_info_lines()?);
        Ok(ctx.draw(plot)?)
    }

    /// Draws the event size and returns the fitted mean hits per event when
    /// `fit` is set.
    ///
    /// # Errors
    /// Returns an analysis or draw error.
    pub fn draw_event_size<P: PlotSink>(&self, ctx: &mut DrawContext<P>, fit: bool) -> Result<Option<f64>> {
        let histogram = self.event_size()?;
        let fit = if fit { Some(fit_poisson(&histogram, PoissonSeed::default())?) } else { None };
        let plot = Plot::new(
            "event_size",
            "Event Size",
            PlotData::Histogram {
                display_range: histogram.filled_range(DISPLAY_MARGIN_BINS),
                histogram,
                fit,
            },
        )
        .with_axes("Number of Hits per Event", "Number of Entries")
        .with_info(self.run_info_lines()?);
        ctx.draw(plot)?;
        Ok(fit.map(|f| f.lambda))
    }

    /// # Errors
    /// Returns an analysis or draw error.
    pub fn draw_time_profile<P: PlotSink>(&self, ctx: &mut DrawContext<P>) -> Result<()> {
        let plot = Plot::new(
            "buffer_time_profile",
            "Time Evolution of the Buffer Corruptions",
            PlotData::Profile {
                profile: self.time_profile()?,
            },
        )
        .with_axes("Event Number", "Buffer Corruption [per mill]")
        .with_info(self.run_info_lines()?);
        Ok(ctx.draw(plot)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::MemoryPlotSink;
    use approx::assert_relative_eq;
    use pixerr_core::HitRecord;
    use pixerr_io::MemoryEventStore;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    fn analyser(entries: u64, hits: Vec<HitRecord>) -> (ErrorAnalyser<MemoryEventStore>, TempDir) {
        let dir = tempdir().unwrap();
        let info = RunInfo {
            run: 16,
            voltage: 500,
            current: 20,
            path: PathBuf::from("run016-500-20.pxer"),
        };
        let store = MemoryEventStore::from_records(entries, hits);
        let cache = ResultCache::new(dir.path());
        (ErrorAnalyser::new(info, store, cache), dir)
    }

    fn sample_hits() -> Vec<HitRecord> {
        vec![
            HitRecord::new(0, 4, 10, 20),
            HitRecord::new(0, 4, 10, 21),
            HitRecord::new(1, 4, 10, 22).with_error(ErrorKind::BufferCorruption, 1),
            HitRecord::new(1, 12, 0, 0).with_error(ErrorKind::InvalidAddress, 2),
            HitRecord::new(3, 0, 3, 80),
            HitRecord::new(3, 0, 3, 5).with_error(ErrorKind::InvalidPulseHeight, 1),
        ]
    }

    #[test]
    fn test_counts_and_totals() {
        let (ana, _dir) = analyser(10, sample_hits());
        assert_eq!(ana.valid_hits().unwrap(), 5);
        // events 0 and 3 are clean, event 1 has a corrupted hit
        assert_eq!(ana.valid_events().unwrap(), 2);
        assert_eq!(ana.buffer_errors().unwrap(), 1);
        assert_eq!(ana.invalid_addresses().unwrap(), 2);
        assert_eq!(ana.invalid_pulse_heights().unwrap(), 1);
        assert_relative_eq!(ana.buffer_proportion().unwrap(), 20.0);
        assert_relative_eq!(ana.hit_rate().unwrap(), 5.0 / (2.5e-8 * 10.0));
    }

    #[test]
    fn test_event_rate() {
        let (ana, _dir) = analyser(10, sample_hits());
        // 2 clean events in 10 entries of 25 ns
        assert_relative_eq!(ana.event_rate().unwrap(), 2.0 / (2.5e-8 * 10.0));
        assert_eq!(ana.event_rate_string().unwrap(), "8.0000 MHz");

        let (empty, _dir) = analyser(0, Vec::new());
        assert_relative_eq!(empty.event_rate().unwrap(), 0.0);
        assert_eq!(empty.event_rate_string().unwrap(), "0.0000 MHz");
    }

    #[test]
    fn test_values_come_from_cache() {
        let dir = tempdir().unwrap();
        let info = RunInfo {
            run: 3,
            voltage: 0,
            current: 0,
            path: PathBuf::new(),
        };
        let first = ErrorAnalyser::new(
            info.clone(),
            MemoryEventStore::from_records(10, sample_hits()),
            ResultCache::new(dir.path()),
        );
        assert_eq!(first.valid_hits().unwrap(), 5);
        assert!(dir.path().join("ValidHits/003.bin").exists());

        // Same run and cache root, different data: the cached value wins.
        let second = ErrorAnalyser::new(
            info,
            MemoryEventStore::from_records(10, Vec::new()),
            ResultCache::new(dir.path()),
        );
        assert_eq!(second.valid_hits().unwrap(), 5);
    }

    #[test]
    fn test_module_occupancy_skips_readout_row() {
        let (ana, _dir) = analyser(10, sample_hits());
        let map = ana.module_occupancy().unwrap();
        assert_relative_eq!(map.total(), 5.0);
        // chip 4 -> slot 0: no mirroring
        assert_relative_eq!(map.get(10, 20).unwrap(), 1.0);
        // chip 12 -> slot 8: mirrored into the top right corner
        assert_relative_eq!(map.get(415, 159).unwrap(), 1.0);
    }

    #[test]
    fn test_buffer_maps() {
        let (ana, _dir) = analyser(10, sample_hits());
        let abs = ana.buffer_map(false).unwrap();
        // chip 4, col 10 has one corrupted hit, spread over its 80 rows
        assert_relative_eq!(abs.get(10, 0).unwrap(), 1.0);
        assert_relative_eq!(abs.get(10, 79).unwrap(), 1.0);
        assert_relative_eq!(abs.total(), 80.0);

        let rel = ana.buffer_map(true).unwrap();
        // 3 hits in the column of which 1 is bad: 1 / (3 + 1) per mille
        assert_relative_eq!(rel.get(10, 40).unwrap(), 250.0);
        assert_relative_eq!(rel.get(11, 40).unwrap(), 0.0);
    }

    #[test]
    fn test_relative_map_without_hits_is_zero() {
        let (ana, _dir) = analyser(10, Vec::new());
        let rel = ana.buffer_map(true).unwrap();
        assert_relative_eq!(rel.total(), 0.0);
        assert_relative_eq!(ana.buffer_proportion().unwrap(), 0.0);
        assert_relative_eq!(ana.hit_rate().unwrap(), 0.0);
    }

    #[test]
    fn test_event_size_counts_empty_entries() {
        let (ana, _dir) = analyser(10, sample_hits());
        let hist = ana.event_size().unwrap();
        assert_relative_eq!(hist.counts()[0], 7.0);
        assert_relative_eq!(hist.counts()[2], 3.0);
        assert_relative_eq!(hist.entries(), 10.0);
    }

    #[test]
    fn test_chip_occupancy() {
        let (ana, _dir) = analyser(10, sample_hits());
        let occ = ana.chip_occupancy(4).unwrap();
        assert_eq!(occ.dim(), (52, 80));
        assert_relative_eq!(occ.sum(), 3.0);
        assert!(ana.chip_occupancy(16).is_err());
    }

    #[test]
    fn test_time_profile() {
        let hits = vec![
            HitRecord::new(100, 0, 0, 0).with_error(ErrorKind::BufferCorruption, 1),
            HitRecord::new(200, 0, 0, 0),
            HitRecord::new(7000, 0, 0, 0),
        ];
        let (ana, _dir) = analyser(10_000, hits);
        let profile = ana.time_profile().unwrap();
        assert_eq!(profile.n_bins(), 2);
        assert_eq!(profile.entries(), &[2, 1]);
        assert_relative_eq!(profile.means()[0], 500.0);
    }

    #[test]
    fn test_run_info_lines() {
        let (ana, _dir) = analyser(10, sample_hits());
        let lines = ana.run_info_lines().unwrap();
        // 5 hits in 10 entries of 25 ns
        assert_eq!(lines[0], "Run 16:  20.0 MHz, 5 Min (10 evts)");
        assert_eq!(lines[1], "Module: M1109 @ 500kV and 20mA");
    }

    #[test]
    fn test_draws_reach_the_sink() {
        let (ana, _dir) = analyser(10, sample_hits());
        let mut ctx = DrawContext::new(MemoryPlotSink::default());
        ana.draw_module_occupancy(&mut ctx).unwrap();
        ana.draw_buffer_map(&mut ctx, true).unwrap();
        ana.draw_occupancy(&mut ctx, 4).unwrap();
        ana.draw_time_profile(&mut ctx).unwrap();
        assert_eq!(ana.draw_event_size(&mut ctx, false).unwrap(), None);

        let sink = ctx.into_sink();
        assert_eq!(sink.plots().len(), 5);
        let module = sink.find("module_occupancy").unwrap();
        assert_eq!(module.info.len(), 2);
        match &module.data {
            PlotData::Map { values, grid } => {
                assert_eq!(values.dim(), (416, 160));
                assert_eq!(grid.len(), 16);
            }
            other => panic!("unexpected plot data {other:?}"),
        }
        assert_eq!(
            sink.find("buffer_map_rel").unwrap().z_title.as_deref(),
            Some("Buffer Errors [per mill]")
        );
    }
}
