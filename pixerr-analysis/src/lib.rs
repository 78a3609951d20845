//! pixerr-analysis: Read-out error analysis of pixel modules.
//!
//! This crate provides the per-run [`ErrorAnalyser`], the [`RunSelection`]
//! with its run plan table, and the [`AnalysisCollection`] and
//! [`PlanCollection`] aggregates. Plots are described by [`Plot`] values and
//! handed to a [`PlotSink`] through a [`DrawContext`].
//!

pub mod analyser;
pub mod collection;
pub mod config;
pub mod draw;
mod error;
pub mod plans;
pub mod plot;
pub mod selection;

pub use analyser::ErrorAnalyser;
pub use collection::AnalysisCollection;
pub use config::AnalysisConfig;
pub use draw::{DrawContext, PALETTE};
pub use error::{AnalysisError, DrawError, Result};
pub use plans::PlanCollection;
pub use plot::{JsonPlotSink, MemoryPlotSink, Plot, PlotData, PlotSink, Series};
pub use selection::{display_setting, format_plan_key, RunPlan, RunSelection};
