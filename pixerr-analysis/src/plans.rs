//! Comparison of several run plans.

use crate::collection::AnalysisCollection;
use crate::config::AnalysisConfig;
use crate::draw::DrawContext;
use crate::plot::{Plot, PlotData, PlotSink, Series};
use crate::selection::{format_plan_key, RunSelection};
use crate::{AnalysisError, Result};
use pixerr_io::{EventFileReader, EventStore};

/// One [`AnalysisCollection`] per run plan, in request order.
pub struct PlanCollection<S: EventStore = EventFileReader> {
    collections: Vec<AnalysisCollection<S>>,
}

impl PlanCollection<EventFileReader> {
    /// Loads the given plans. Plans that are missing or have no readable run
    /// are skipped with a warning.
    ///
    /// # Errors
    /// Returns [`AnalysisError::EmptyCollection`] if no plan could be loaded,
    /// or the first error that is not a missing run or plan.
    pub fn new(plan_ids: &[u32], config: &AnalysisConfig) -> Result<Self> {
        let mut selection = RunSelection::load(config)?;
        let mut collections = Vec::new();
        for &id in plan_ids {
            if !selection.select_runs_from_plan(id) {
                log::warn!("Skipping run plan {}", format_plan_key(id));
                continue;
            }
            match AnalysisCollection::new(&selection, config, Some(id)) {
                Ok(collection) => collections.push(collection),
                Err(e) if e.is_recoverable() => log::warn!("{e}"),
                Err(e) => return Err(e),
            }
        }
        Self::from_collections(collections)
    }
}

impl<S: EventStore> PlanCollection<S> {
    /// # Errors
    /// Returns [`AnalysisError::EmptyCollection`] if `collections` is empty.
    pub fn from_collections(collections: Vec<AnalysisCollection<S>>) -> Result<Self> {
        if collections.is_empty() {
            return Err(AnalysisError::EmptyCollection(
                "no run plan could be loaded".to_string(),
            ));
        }
        Ok(Self { collections })
    }

    #[must_use]
    pub fn collections(&self) -> &[AnalysisCollection<S>] {
        &self.collections
    }

    /// Keys of the loaded plans.
    #[must_use]
    pub fn plan_keys(&self) -> Vec<&str> {
        self.collections
            .iter()
            .filter_map(AnalysisCollection::plan_key)
            .collect()
    }

    /// One buffer error series per plan, labelled with its trim and ctrlreg.
    ///
    /// # Errors
    /// Returns the first analysis error.
    pub fn buffer_error_series(&self) -> Result<Vec<Series>> {
        self.collections
            .iter()
            .map(AnalysisCollection::buffer_error_series)
            .collect()
    }

    /// Draws all plan series in one graph, each in the next palette colour.
    ///
    /// # Errors
    /// Returns an analysis or draw error.
    pub fn draw_buffer_corruptions<P: PlotSink>(&self, ctx: &mut DrawContext<P>) -> Result<Vec<Series>> {
        let mut series = self.buffer_error_series()?;
        for s in &mut series {
            s.color = ctx.next_color();
        }
        let plot = Plot::new(
            "buffer_corruptions",
            "Buffer Corruptions",
            PlotData::MultiGraph {
                series: series.clone(),
            },
        )
        .with_axes("Hit Rate [MHz]", "Buffer Corruptions [%]");
        ctx.draw(plot)?;
        Ok(series)
    }
}
