//! Aggregation over the runs of a selection or run plan.

use crate::analyser::ErrorAnalyser;
use crate::config::AnalysisConfig;
use crate::draw::DrawContext;
use crate::plot::{Plot, PlotData, PlotSink, Series};
use crate::selection::{display_setting, format_plan_key, RunPlan, RunSelection};
use crate::{AnalysisError, Result};
use pixerr_core::ModuleMap;
use pixerr_io::{EventFileReader, EventStore};
use serde_json::Value;

/// One [`ErrorAnalyser`] per selected run, in run order.
pub struct AnalysisCollection<S: EventStore = EventFileReader> {
    analysers: Vec<ErrorAnalyser<S>>,
    plan: Option<(String, RunPlan)>,
}

impl AnalysisCollection<EventFileReader> {
    /// Opens the selected runs. Runs without a backing file are skipped with
    /// a warning. `plan_id` attaches the plan's trim and ctrlreg settings.
    ///
    /// # Errors
    /// Returns [`AnalysisError::EmptyCollection`] if no run could be opened,
    /// or the first error that is not a missing run.
    pub fn new(
        selection: &RunSelection,
        config: &AnalysisConfig,
        plan_id: Option<u32>,
    ) -> Result<Self> {
        let mut analysers = Vec::new();
        for run in selection.selected_runs() {
            match ErrorAnalyser::open(config, selection.catalog(), run) {
                Ok(analyser) => analysers.push(analyser),
                Err(e) if e.is_recoverable() => log::warn!("{e}"),
                Err(e) => return Err(e),
            }
        }
        let plan = plan_id
            .and_then(|id| selection.plan(id).map(|plan| (format_plan_key(id), plan.clone())));
        Self::from_analysers(analysers, plan)
    }
}

impl<S: EventStore> AnalysisCollection<S> {
    /// Builds a collection from opened analysers.
    ///
    /// # Errors
    /// Returns [`AnalysisError::EmptyCollection`] if `analysers` is empty.
    pub fn from_analysers(
        mut analysers: Vec<ErrorAnalyser<S>>,
        plan: Option<(String, RunPlan)>,
    ) -> Result<Self> {
        if analysers.is_empty() {
            let what = plan
                .as_ref()
                .map_or_else(|| "selection".to_string(), |(key, _)| format!("run plan {key}"));
            return Err(AnalysisError::EmptyCollection(format!(
                "no run of the {what} could be loaded"
            )));
        }
        analysers.sort_by_key(ErrorAnalyser::run);
        Ok(Self { analysers, plan })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.analysers.len()
    }

    /// Always false: a collection holds at least one run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analysers.is_empty()
    }

    #[must_use]
    pub fn runs(&self) -> Vec<u32> {
        self.analysers.iter().map(ErrorAnalyser::run).collect()
    }

    #[must_use]
    pub fn analysers(&self) -> &[ErrorAnalyser<S>] {
        &self.analysers
    }

    #[must_use]
    pub fn first_analysis(&self) -> &ErrorAnalyser<S> {
        &self.analysers[0]
    }

    fn last_analysis(&self) -> &ErrorAnalyser<S> {
        &self.analysers[self.analysers.len() - 1]
    }

    /// Zero-padded key of the plan the runs come from.
    #[must_use]
    pub fn plan_key(&self) -> Option<&str> {
        self.plan.as_ref().map(|(key, _)| key.as_str())
    }

    #[must_use]
    pub fn trim(&self) -> Option<&Value> {
        self.plan.as_ref().map(|(_, plan)| &plan.trim)
    }

    #[must_use]
    pub fn ctrlreg(&self) -> Option<&Value> {
        self.plan.as_ref().map(|(_, plan)| &plan.ctrlreg)
    }

    /// Output sub directory: `rp<key>` for a plan, `runs<first>-<last>` otherwise.
    #[must_use]
    pub fn save_dir(&self) -> String {
        match self.plan_key() {
            Some(key) => format!("rp{key}"),
            None => format!("runs{}-{}", self.first_analysis().run(), self.last_analysis().run()),
        }
    }

    /// Legend label of the collection's series.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.plan {
            Some((_, plan)) => format!(
                "Trim: {}, ctrlreg: {}",
                display_setting(&plan.trim),
                display_setting(&plan.ctrlreg)
            ),
            None => self.run_info_lines()[0].clone(),
        }
    }

    /// Hit rate of every run in Hz.
    ///
    /// # Errors
    /// Returns the first analysis error.
    pub fn hit_rates(&self) -> Result<Vec<f64>> {
        self.analysers.iter().map(ErrorAnalyser::hit_rate).collect()
    }

    /// Buffer error proportion of every run in percent.
    ///
    /// # Errors
    /// Returns the first analysis error.
    pub fn buffer_proportions(&self) -> Result<Vec<f64>> {
        self.analysers
            .iter()
            .map(ErrorAnalyser::buffer_proportion)
            .collect()
    }

    /// Module occupancy summed over all runs.
    ///
    /// # Errors
    /// Returns the first analysis error.
    pub fn module_occupancy(&self) -> Result<ModuleMap> {
        self.sum_maps(ErrorAnalyser::module_occupancy)
    }

    /// Buffer maps summed over all runs.
    ///
    /// # Errors
    /// Returns the first analysis error.
    pub fn buffer_map(&self, rel: bool) -> Result<ModuleMap> {
        self.sum_maps(|analyser| analyser.buffer_map(rel))
    }

    fn sum_maps<F>(&self, map_of: F) -> Result<ModuleMap>
    where
        F: Fn(&ErrorAnalyser<S>) -> Result<ModuleMap>,
    {
        let mut total = ModuleMap::new(self.first_analysis().geometry());
        for analyser in &self.analysers {
            total.accumulate(&map_of(analyser)?)?;
        }
        Ok(total)
    }

    /// Buffer error proportion in percent versus hit rate in MHz.
    ///
    /// # Errors
    /// Returns the first analysis error.
    pub fn buffer_error_series(&self) -> Result<Series> {
        let rates = self.hit_rates()?.into_iter().map(|r| r / 1e6).collect();
        Ok(Series::new(self.label(), rates, self.buffer_proportions()?))
    }

    /// Run info legend lines of the collection.
    #[must_use]
    pub fn run_info_lines(&self) -> Vec<String> {
        vec![
            format!(
                "Runs {}-{}",
                self.first_analysis().run(),
                self.last_analysis().run()
            ),
            format!("Module: {}", self.first_analysis().module_name()),
        ]
    }

    /// # Errors
    /// Returns an analysis or draw error.
    pub fn draw_buffer_errors<P: PlotSink>(&self, ctx: &mut DrawContext<P>) -> Result<Series> {
        let series = self.buffer_error_series()?;
        let plot = Plot::new(
            "buffer_errors",
            "Buffer Corruptions",
            PlotData::Graph {
                series: series.clone(),
            },
        )
        .with_axes("Hit Rate [MHz]", "Buffer Corruptions [%]")
        .with_info(self.run_info_lines());
        ctx.draw(plot)?;
        Ok(series)
    }

    /// # Errors
    /// Returns an analysis or draw error.
    pub fn draw_module_occupancy<P: PlotSink>(&self, ctx: &mut DrawContext<P>) -> Result<ModuleMap> {
        let map = self.module_occupancy()?;
        self.draw_map(ctx, "module_occupancy", "Module Occupancy", "Number of Entries", &map)?;
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
        self.draw_map(ctx, name, "Buffer Corruptions", z_title, &map)?;
        Ok(map)
    }

    fn draw_map<P: PlotSink>(
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
                grid: self.first_analysis().module_grid(),
            },
        )
        .with_axes("col", "row")
        .with_z_title(z_title)
        .with_info(self.run_info_lines());
        Ok(ctx.draw(plot)?)
    }
}
