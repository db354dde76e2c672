//! Visualization routing: which chart shape a routed indicator gets.

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Chart shape requested by the user for routed indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VizMode {
    /// Value vs. period, one series per company.
    Line,
    /// Company x period matrix.
    Heatmap,
    /// One aggregated value per company.
    Bar,
}

impl VizMode {
    pub const ALL: [VizMode; 3] = [VizMode::Line, VizMode::Heatmap, VizMode::Bar];

    pub fn display_name(self) -> &'static str {
        match self {
            VizMode::Line => "Line",
            VizMode::Heatmap => "Heatmap",
            VizMode::Bar => "Bar",
        }
    }

    pub fn next(self) -> Self {
        match self {
            VizMode::Line => VizMode::Heatmap,
            VizMode::Heatmap => VizMode::Bar,
            VizMode::Bar => VizMode::Line,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            VizMode::Line => VizMode::Bar,
            VizMode::Heatmap => VizMode::Line,
            VizMode::Bar => VizMode::Heatmap,
        }
    }
}

impl FromStr for VizMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line" | "linha" => Ok(VizMode::Line),
            "heatmap" | "mapa de calor" => Ok(VizMode::Heatmap),
            "bar" | "barra" | "barras" => Ok(VizMode::Bar),
            _ => Err(AppError::InvalidVisualization(s.to_string())),
        }
    }
}

impl std::fmt::Display for VizMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Concrete shape handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Line,
    Heatmap,
    Bar,
    /// Bar forced by a single-period working subset.
    DegenerateBar,
}

impl RenderMode {
    pub fn is_bar(self) -> bool {
        matches!(self, RenderMode::Bar | RenderMode::DegenerateBar)
    }
}

/// Decide the render mode from the number of distinct periods in the working
/// subset and the user's choice.
///
/// Exactly one period always collapses to `DegenerateBar`: a single point can't
/// be drawn as a line or a multi-column heatmap.
pub fn route(period_count: usize, choice: VizMode) -> RenderMode {
    if period_count == 1 {
        return RenderMode::DegenerateBar;
    }
    match choice {
        VizMode::Line => RenderMode::Line,
        VizMode::Heatmap => RenderMode::Heatmap,
        VizMode::Bar => RenderMode::Bar,
    }
}
