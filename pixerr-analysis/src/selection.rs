//! Run selection and the run plan table.
//!
//! A [`RunSelection`] keeps one flag per catalog run. Run plans are named
//! groups of runs with their trim and control register settings, persisted
//! as a JSON object keyed by the zero-padded plan id.

use crate::config::AnalysisConfig;
use crate::{AnalysisError, Result};
use pixerr_io::RunCatalog;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One entry of the run plan table. Fields are in key order of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPlan {
    pub ctrlreg: Value,
    pub runs: Vec<u32>,
    pub trim: Value,
}

/// Plan table key for a plan id: two digits for ids up to 99, four otherwise.
#[must_use]
pub fn format_plan_key(id: u32) -> String {
    if id < 100 {
        format!("{id:02}")
    } else {
        format!("{id:04}")
    }
}

/// Renders a plan setting without JSON string quotes.
#[must_use]
pub fn display_setting(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Boolean selection over the runs of a catalog, plus the plan table.
#[derive(Debug, Clone)]
pub struct RunSelection {
    catalog: RunCatalog,
    plans: BTreeMap<String, RunPlan>,
    plan_path: PathBuf,
    selected: BTreeMap<u32, bool>,
}

impl RunSelection {
    /// Scans the data directory and reads the run plan table.
    ///
    /// A missing plan file starts an empty table.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be read or the plan
    /// file exists but is not a valid table.
    pub fn load(config: &AnalysisConfig) -> Result<Self> {
        let catalog = RunCatalog::scan(&config.data_dir)?;
        let plans = load_plans(&config.run_plan_path)?;
        Ok(Self::new(catalog, plans, config.run_plan_path.clone()))
    }

    /// Creates a selection with nothing selected.
    #[must_use]
    pub fn new(
        catalog: RunCatalog,
        plans: BTreeMap<String, RunPlan>,
        plan_path: impl Into<PathBuf>,
    ) -> Self {
        let selected = catalog.runs().map(|run| (run, false)).collect();
        Self {
            catalog,
            plans,
            plan_path: plan_path.into(),
            selected,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &RunCatalog {
        &self.catalog
    }

    /// Deselects every run.
    pub fn reset_selection(&mut self) {
        self.selected.values_mut().for_each(|s| *s = false);
    }

    pub fn select_run(&mut self, run: u32) {
        self.set_run(run, true);
    }

    pub fn deselect_run(&mut self, run: u32) {
        self.set_run(run, false);
    }

    fn set_run(&mut self, run: u32, selected: bool) {
        match self.selected.get_mut(&run) {
            Some(flag) => *flag = selected,
            None => log::warn!("Run {run} not found in list of run numbers"),
        }
    }

    /// Selects the catalog runs in `lo..=hi`.
    pub fn select_range(&mut self, lo: u32, hi: u32) {
        self.set_range(lo, hi, true);
    }

    /// Deselects the catalog runs in `lo..=hi`.
    pub fn deselect_range(&mut self, lo: u32, hi: u32) {
        self.set_range(lo, hi, false);
    }

    fn set_range(&mut self, lo: u32, hi: u32, selected: bool) {
        if lo > hi {
            return;
        }
        for (_, flag) in self.selected.range_mut(lo..=hi) {
            *flag = selected;
        }
    }

    #[must_use]
    pub fn is_selected(&self, run: u32) -> bool {
        self.selected.get(&run).copied().unwrap_or(false)
    }

    /// Selected runs in ascending order. Warns if there are none.
    #[must_use]
    pub fn selected_runs(&self) -> Vec<u32> {
        let runs: Vec<u32> = self
            .selected
            .iter()
            .filter_map(|(&run, &selected)| selected.then_some(run))
            .collect();
        if runs.is_empty() {
            log::warn!("No runs selected!");
        }
        runs
    }

    /// Replaces the selection by the runs of a plan.
    ///
    /// Selects every catalog run between the first and the last run of the
    /// plan, inclusive, even if the plan lists fewer runs. Returns false and
    /// leaves the selection empty if the plan is unknown or none of its runs
    /// is in the catalog.
    pub fn select_runs_from_plan(&mut self, id: u32) -> bool {
        self.reset_selection();
        let key = format_plan_key(id);
        let Some(plan) = self.plans.get(&key) else {
            log::warn!("Run plan {key} does not exist");
            return false;
        };
        let (Some(&first), Some(&last)) = (plan.runs.first(), plan.runs.last()) else {
            log::warn!("Run plan {key} has no runs");
            return false;
        };
        if !plan.runs.iter().any(|&run| self.catalog.contains(run)) {
            log::warn!("None of the runs of plan {key} are in {}", self.catalog.dir().display());
            return false;
        }
        self.select_range(first, last);
        true
    }

    /// Stores the current selection as plan `id` and rewrites the plan file.
    ///
    /// # Errors
    /// Returns [`AnalysisError::EmptySelection`] if no run is selected, or a
    /// file error if the table cannot be written.
    pub fn add_selection_to_runplan(&mut self, id: u32, trim: Value, ctrlreg: Value) -> Result<()> {
        let runs = self.selected_runs();
        if runs.is_empty() {
            return Err(AnalysisError::EmptySelection);
        }
        let key = format_plan_key(id);
        log::info!("saving {} runs as run plan {key}", runs.len());
        self.plans.insert(key, RunPlan { runs, trim, ctrlreg });
        self.save_runplan()
    }

    /// Writes the whole plan table, pretty printed with sorted keys.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_runplan(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.plans)?;
        if let Some(dir) = self.plan_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.plan_path, json)?;
        Ok(())
    }

    /// Plan stored under `id`.
    #[must_use]
    pub fn plan(&self, id: u32) -> Option<&RunPlan> {
        self.plans.get(&format_plan_key(id))
    }

    /// Plan keys in sorted order.
    pub fn plan_ids(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    /// Plans with their keys in sorted order.
    pub fn plans(&self) -> impl Iterator<Item = (&str, &RunPlan)> {
        self.plans.iter().map(|(key, plan)| (key.as_str(), plan))
    }

    /// Table of all catalog runs.
    #[must_use]
    pub fn run_info_table(&self) -> String {
        self.table(self.catalog.runs())
    }

    /// Table of the selected runs, preceded by their count.
    #[must_use]
    pub fn selected_runs_table(&self) -> String {
        let runs = self.selected_runs();
        let mut out = format!("The selection contains {} runs\n\n", runs.len());
        out.push_str(&self.table(runs.into_iter()));
        out
    }

    fn table(&self, runs: impl Iterator<Item = u32>) -> String {
        let mut out = String::from("Run\tCurrent [mA]\tVoltage [kV]\n");
        for info in runs.filter_map(|run| self.catalog.get(run)) {
            out.push_str(&format!(
                "{:>3}\t{:>12}\t{:>12}\n",
                info.run, info.current, info.voltage
            ));
        }
        out
    }
}

fn load_plans(path: &Path) -> Result<BTreeMap<String, RunPlan>> {
    match fs::read_to_string(path) {
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("There is no run plan file yet: {}", path.display());
            Ok(BTreeMap::new())
        }
        Err(e) => Err(e.into()),
    }
}
