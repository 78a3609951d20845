//! Plot descriptors and sinks.
//!
//! Analyses do not render anything themselves. They describe each plot as a
//! [`Plot`] and hand it to a [`PlotSink`].

use crate::error::DrawError;
use ndarray::Array2;
use pixerr_core::{ChipOutline, Histogram1D, PoissonFit, Profile1D};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// One XY series of a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// ROOT colour index, 1 (black) unless set by a draw context.
    pub color: u16,
}

impl Series {
    #[must_use]
    pub fn new(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            color: 1,
        }
    }
}

/// Plot payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotData {
    Histogram {
        histogram: Histogram1D,
        /// Bin range worth showing.
        display_range: Option<(usize, usize)>,
        fit: Option<PoissonFit>,
    },
    Profile {
        profile: Profile1D,
    },
    /// 2D map with unit bins centred on integer coordinates.
    Map {
        values: Array2<f64>,
        /// Chip outlines drawn on top of the map.
        grid: Vec<ChipOutline>,
    },
    Graph {
        series: Series,
    },
    MultiGraph {
        series: Vec<Series>,
    },
}

/// A plot with its display metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plot {
    pub name: String,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub z_title: Option<String>,
    /// Run info legend lines.
    pub info: Vec<String>,
    /// Output sub directory.
    pub sub_dir: Option<String>,
    pub data: PlotData,
}

impl Plot {
    #[must_use]
    pub fn new(name: impl Into<String>, title: impl Into<String>, data: PlotData) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            x_title: String::new(),
            y_title: String::new(),
            z_title: None,
            info: Vec::new(),
            sub_dir: None,
            data,
        }
    }

    #[must_use]
    pub fn with_axes(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_title = x.into();
        self.y_title = y.into();
        self
    }

    #[must_use]
    pub fn with_z_title(mut self, z: impl Into<String>) -> Self {
        self.z_title = Some(z.into());
        self
    }

    #[must_use]
    pub fn with_info(mut self, info: Vec<String>) -> Self {
        self.info = info;
        self
    }
}

/// Receives finished plots.
pub trait PlotSink {
    /// Outputs one plot.
    ///
    /// # Errors
    /// Returns a [`DrawError`] if the plot cannot be written.
    fn draw(&mut self, plot: Plot) -> Result<(), DrawError>;
}

/// Writes every plot as `<root>/<sub_dir>/<name>.json`.
#[derive(Debug, Clone, Default)]
pub struct JsonPlotSink {
    root: Option<PathBuf>,
}

impl JsonPlotSink {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// A sink without output directory; drawing fails with [`DrawError::NoCanvas`].
    #[must_use]
    pub fn detached() -> Self {
        Self { root: None }
    }
}

impl PlotSink for JsonPlotSink {
    fn draw(&mut self, plot: Plot) -> Result<(), DrawError> {
        let root = self.root.as_ref().ok_or(DrawError::NoCanvas)?;
        let dir = match &plot.sub_dir {
            Some(sub) => root.join(sub),
            None => root.clone(),
        };
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.json", plot.name));
        fs::write(&path, serde_json::to_string_pretty(&plot)?)?;
        log::info!("Saving plots: {}", path.display());
        Ok(())
    }
}

/// Keeps plots in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlotSink {
    plots: Vec<Plot>,
}

impl MemoryPlotSink {
    #[must_use]
    pub fn plots(&self) -> &[Plot] {
        &self.plots
    }

    /// Most recent plot with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Plot> {
        self.plots.iter().rev().find(|p| p.name == name)
    }
}

impl PlotSink for MemoryPlotSink {
    fn draw(&mut self, plot: Plot) -> Result<(), DrawError> {
        self.plots.push(plot);
        Ok(())
    }
}
