#![allow(clippy::cast_possible_truncation, clippy::unreadable_literal)]
use approx::assert_relative_eq;
use pixerr_analysis::{AnalysisCollection, DrawContext, ErrorAnalyser, MemoryPlotSink, PlotData};
use pixerr_core::{ErrorKind, HitRecord};
use pixerr_io::{MemoryEventStore, ResultCache, RunInfo};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn run_info(run: u32) -> RunInfo {
    RunInfo {
        run,
        voltage: 500,
        current: 20,
        path: PathBuf::from(format!("run{run:03}-500-20.pxer")),
    }
}

// One hit per entry, spread over the whole module.
fn hit(i: u32) -> HitRecord {
    HitRecord::new(i, (i % 16) as u8, ((i / 16) % 52) as u8, ((i / 832) % 80) as u8)
}

fn analyser(
    cache_root: &Path,
    run: u32,
    entries: u64,
    hits: Vec<HitRecord>,
) -> ErrorAnalyser<MemoryEventStore> {
    ErrorAnalyser::new(
        run_info(run),
        MemoryEventStore::from_records(entries, hits),
        ResultCache::new(cache_root),
    )
}

#[test]
fn test_million_entry_run() {
    let dir = tempdir().unwrap();
    let mut hits: Vec<HitRecord> = (0..900_000).map(hit).collect();
    hits.extend((900_000..900_500).map(|i| hit(i).with_error(ErrorKind::BufferCorruption, 1)));
    let ana = analyser(dir.path(), 1, 1_000_000, hits);

    assert_eq!(ana.valid_hits().unwrap(), 900_000);
    assert_eq!(ana.buffer_errors().unwrap(), 500);
    // 900000 / (2.5e-8 * 1e6)
    assert_relative_eq!(ana.hit_rate().unwrap(), 3.6e7, max_relative = 1e-12);
    assert_eq!(ana.hit_rate_string().unwrap(), " 36.0 MHz");
    assert_relative_eq!(
        ana.buffer_proportion().unwrap(),
        500.0 / 900_000.0 * 100.0,
        max_relative = 1e-12
    );
    assert_relative_eq!(ana.buffer_proportion().unwrap(), 0.0556, epsilon = 1e-4);

    // Every hit lands on the module; nothing uses the read-out row.
    assert_relative_eq!(ana.module_occupancy().unwrap().total(), 900_500.0);
}

#[test]
fn test_event_size_fit_recovers_mean() {
    let dir = tempdir().unwrap();
    // 1000 entries, Poisson-like sizes with mean 3 built from exact expected counts
    let expected = [50u32, 149, 224, 224, 168, 101, 50, 22, 8, 3, 1];
    let mut hits = Vec::new();
    let mut event = 0u32;
    for (size, &count) in expected.iter().enumerate() {
        for _ in 0..count {
            for k in 0..size {
                hits.push(HitRecord::new(event, 0, k as u8, 0));
            }
            event += 1;
        }
    }
    let ana = analyser(dir.path(), 2, u64::from(event), hits);
    let fit = ana.event_size_fit().unwrap();
    assert_relative_eq!(fit.lambda, 3.0, epsilon = 0.05);

    let mut ctx = DrawContext::new(MemoryPlotSink::default());
    let lambda = ana.draw_event_size(&mut ctx, true).unwrap().unwrap();
    assert_relative_eq!(lambda, fit.lambda);
    match &ctx.sink().plots()[0].data {
        PlotData::Histogram { display_range, .. } => assert_eq!(*display_range, Some((0, 13))),
        other => panic!("unexpected plot data {other:?}"),
    }
}

#[test]
fn test_collection_sums_maps_and_keeps_run_order() {
    let dir = tempdir().unwrap();
    let corrupted = |i| hit(i).with_error(ErrorKind::BufferCorruption, 1);
    let analysers = vec![
        analyser(dir.path(), 7, 100, vec![hit(0), hit(1), corrupted(2)]),
        analyser(dir.path(), 3, 100, vec![hit(0)]),
    ];
    let collection = AnalysisCollection::from_analysers(analysers, None).unwrap();
    assert_eq!(collection.runs(), vec![3, 7]);
    assert_eq!(collection.save_dir(), "runs3-7");
    assert_eq!(collection.run_info_lines()[0], "Runs 3-7");

    let rates = collection.hit_rates().unwrap();
    assert_relative_eq!(rates[0], 1.0 / (2.5e-8 * 100.0));
    assert_relative_eq!(rates[1], 2.0 / (2.5e-8 * 100.0));
    assert_relative_eq!(collection.buffer_proportions().unwrap()[1], 50.0);

    let occupancy = collection.module_occupancy().unwrap();
    assert_relative_eq!(occupancy.total(), 4.0);
    let abs = collection.buffer_map(false).unwrap();
    assert_relative_eq!(abs.total(), 80.0);

    let mut ctx = DrawContext::new(MemoryPlotSink::default());
    let series = collection.draw_buffer_errors(&mut ctx).unwrap();
    assert_eq!(series.label, "Runs 3-7");
    assert_relative_eq!(series.x[0], 0.4);
}

#[test]
fn test_empty_collection_is_an_error() {
    let result = AnalysisCollection::<MemoryEventStore>::from_analysers(Vec::new(), None);
    assert!(matches!(
        result,
        Err(pixerr_analysis::AnalysisError::EmptyCollection(_))
    ));
}
