//! Export a computed dashboard to JSON.
//!
//! The export mirrors what the renderers see: every panel with its axis roles
//! and already-aggregated values, plus the filter that produced it. It is
//! meant to be easy to consume from notebooks or downstream scripts.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::pipeline::Dashboard;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct DashboardExport<'a> {
    tool: &'static str,
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    dashboard: &'a Dashboard,
}

/// Write `dashboard` as pretty-printed JSON.
pub fn write_dashboard_json(path: &Path, dashboard: &Dashboard) -> Result<(), AppError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &export_payload(dashboard))
        .map_err(|e| AppError::Io(e.into()))?;

    tracing::info!(path = %path.display(), panels = dashboard.panels.len(), "exported dashboard");
    Ok(())
}

/// The export document as a JSON value.
pub fn dashboard_json(dashboard: &Dashboard) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(export_payload(dashboard)).map_err(|e| AppError::Io(e.into()))
}

fn export_payload(dashboard: &Dashboard) -> DashboardExport<'_> {
    DashboardExport {
        tool: "bvd",
        generated_at: Utc::now(),
        dashboard,
    }
}
