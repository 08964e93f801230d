//! Declarative chart specs and the renderer seam.
//!
//! Aggregations never draw. They produce tables; a [`ChartSpec`] says which
//! columns to plot and how, and a [`ChartRenderer`] turns the pair into an
//! image file. [`PlottersRenderer`] writes PNGs with `plotters`.

pub mod data;
mod plot;

pub use data::{BarData, HeatmapData, ScatterData};
pub use plot::PlottersRenderer;

use std::path::Path;

use anyhow::Result;

use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Bar per `x_col` category with height `y_col`, split by `hue_col` if set.
    GroupedBar,
    /// `x_col` labels the rows; every other numeric column is a heatmap column.
    Heatmap,
    /// `x_col` against `y_col`, coloured by `hue_col`, marker by `style_col`.
    Scatter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_col: String,
    pub y_col: Option<String>,
    pub hue_col: Option<String>,
    pub style_col: Option<String>,
    pub size: (u32, u32),
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, x_col: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            x_col: x_col.into(),
            y_col: None,
            hue_col: None,
            style_col: None,
            size: (1200, 600),
        }
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y_col = Some(column.into());
        self
    }

    pub fn hue(mut self, column: impl Into<String>) -> Self {
        self.hue_col = Some(column.into());
        self
    }

    pub fn style(mut self, column: impl Into<String>) -> Self {
        self.style_col = Some(column.into());
        self
    }

    pub fn size(mut self, size: (u32, u32)) -> Self {
        self.size = size;
        self
    }

    /// The y column, which bar and scatter charts cannot do without.
    pub(crate) fn required_y(&self) -> Result<&str> {
        self.y_col
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("{:?} chart '{}' needs a y column", self.kind, self.title))
    }
}

/// Sink that draws a table according to a [`ChartSpec`].
pub trait ChartRenderer {
    fn render(&self, spec: &ChartSpec, table: &Table, path: &Path) -> Result<()>;
}
