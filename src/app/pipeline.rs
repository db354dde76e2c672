//! Shared "dashboard pipeline" logic used by the CLI, the TUI and exports.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! filter -> per-chart routing -> aggregation/pivot -> panel
//!
//! Every metric group is described by catalog data; this module is the single
//! interpreter that turns those descriptors into renderer-ready panels.

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{ChartKind, ChartSpec, MetricGroup};
use crate::domain::{Dataset, Indicator};
use crate::error::AppError;
use crate::filter::{FilterSpec, WorkingSet};
use crate::io::ingest::{COMPANY_COLUMN, PERIOD_COLUMN};
use crate::metrics::{Aggregation, period_label};
use crate::viz::{
    self, BarEntry, GroupedBar, HeatmapMatrix, LineSeries, PieChart, RenderMode, TableData, VizMode,
};

/// Everything the control layer selected for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    pub filter: FilterSpec,
    pub group: MetricGroup,
    pub viz: VizMode,
    /// Used by routed charts rendered as `Bar`.
    pub aggregation: Aggregation,
}

/// All computed panels for one render.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub group: MetricGroup,
    pub filter: FilterSpec,
    pub periods: Vec<i32>,
    pub period_label: String,
    pub rows: usize,
    pub companies: Vec<String>,
    pub panels: Vec<Panel>,
}

/// One chart slot, already aggregated/pivoted.
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub title: String,
    /// Render mode chosen by the router (routed charts only).
    pub mode: Option<RenderMode>,
    /// Aggregation applied to produce bar values, if any.
    pub aggregation: Option<Aggregation>,
    pub roles: AxisRoles,
    pub body: PanelBody,
}

/// Which column plays which role for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisRoles {
    /// Category / x axis.
    pub category: String,
    /// Value series.
    pub values: Vec<String>,
    /// Optional grouping key (one series or cell row per group).
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PanelBody {
    Bar(Vec<BarEntry>),
    GroupedBar(GroupedBar),
    Line(Vec<LineSeries>),
    Heatmap(HeatmapMatrix),
    Pie(Vec<PieChart>),
    Table(TableData),
    /// The working subset has no values for this panel.
    NoData,
}

impl PanelBody {
    fn has_values(&self) -> bool {
        match self {
            PanelBody::Bar(bars) => bars.iter().any(|b| b.value.is_some()),
            PanelBody::GroupedBar(g) => g.has_values(),
            PanelBody::Line(series) => series
                .iter()
                .flat_map(|s| &s.points)
                .any(|(_, v)| v.is_some()),
            PanelBody::Heatmap(m) => m.has_values(),
            PanelBody::Pie(pies) => pies
                .iter()
                .flat_map(|p| &p.slices)
                .any(|s| s.value.is_some()),
            PanelBody::Table(t) => !t.rows.is_empty(),
            PanelBody::NoData => false,
        }
    }
}

/// Build every panel of the requested metric group.
pub fn build_dashboard(dataset: &Dataset, request: &DashboardRequest) -> Result<Dashboard, AppError> {
    let ws = request.filter.apply(dataset.rows())?;
    let periods = ws.distinct_periods();

    let panels = request
        .group
        .charts()
        .iter()
        .map(|spec| build_panel(&ws, spec, request, periods.len()))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        group = %request.group,
        rows = ws.len(),
        periods = periods.len(),
        panels = panels.len(),
        "built dashboard"
    );

    Ok(Dashboard {
        group: request.group,
        filter: request.filter.clone(),
        period_label: period_label(&periods),
        periods,
        rows: ws.len(),
        companies: ws.companies().into_iter().map(str::to_string).collect(),
        panels,
    })
}

fn build_panel(
    ws: &WorkingSet<'_>,
    spec: &ChartSpec,
    request: &DashboardRequest,
    period_count: usize,
) -> Result<Panel, AppError> {
    let mut mode = None;
    let mut aggregation = None;

    let (roles, body) = match spec.kind {
        ChartKind::Routed { indicator, allowed } => {
            // Charts only offer some alternatives; fall back to the first one.
            let choice = if allowed.contains(&request.viz) {
                request.viz
            } else {
                allowed.first().copied().unwrap_or(request.viz)
            };
            let routed = viz::route(period_count, choice);
            mode = Some(routed);

            match routed {
                RenderMode::Line => (
                    roles(PERIOD_COLUMN, &[indicator], Some(COMPANY_COLUMN)),
                    PanelBody::Line(viz::line_series(ws, indicator)),
                ),
                RenderMode::Heatmap => (
                    roles(COMPANY_COLUMN, &[indicator], Some(PERIOD_COLUMN)),
                    PanelBody::Heatmap(viz::heatmap(ws, indicator)?),
                ),
                RenderMode::Bar => {
                    aggregation = Some(request.aggregation);
                    (
                        roles(COMPANY_COLUMN, &[indicator], None),
                        PanelBody::Bar(viz::bar_by_company(ws, indicator, request.aggregation)),
                    )
                }
                // One period: each company has a single value, shown as-is.
                RenderMode::DegenerateBar => (
                    roles(COMPANY_COLUMN, &[indicator], None),
                    PanelBody::Bar(viz::bar_by_company(ws, indicator, Aggregation::Sum)),
                ),
            }
        }
        ChartKind::Total { indicator } => {
            aggregation = Some(Aggregation::Sum);
            (
                roles(COMPANY_COLUMN, &[indicator], None),
                PanelBody::Bar(viz::bar_by_company(ws, indicator, Aggregation::Sum)),
            )
        }
        ChartKind::Grouped { indicators } => {
            aggregation = Some(Aggregation::Sum);
            (
                roles(COMPANY_COLUMN, indicators, None),
                PanelBody::GroupedBar(viz::grouped_bar(ws, indicators, Aggregation::Sum)),
            )
        }
        ChartKind::Composition { parts } => {
            aggregation = Some(Aggregation::Sum);
            (
                roles("PARTE", parts, Some(COMPANY_COLUMN)),
                PanelBody::Pie(viz::composition(ws, parts)),
            )
        }
        ChartKind::Table { indicators } => (
            roles(COMPANY_COLUMN, indicators, Some(PERIOD_COLUMN)),
            PanelBody::Table(viz::table(ws, indicators)),
        ),
    };

    let body = if body.has_values() { body } else { PanelBody::NoData };
    debug!(title = spec.title, mode = ?mode, no_data = body == PanelBody::NoData, "built panel");

    Ok(Panel {
        title: spec.title.to_string(),
        mode,
        aggregation,
        roles,
        body,
    })
}

fn roles(category: &str, values: &[Indicator], group: Option<&str>) -> AxisRoles {
    AxisRoles {
        category: category.to_string(),
        values: values.iter().map(|v| v.header().to_string()).collect(),
        group: group.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatementRow;

    fn dataset() -> Dataset {
        let mut rows = Vec::new();
        for (company, base) in [("ALFA SA", 1.0), ("BETA SA", 2.0)] {
            for (i, year) in [2019, 2020, 2021].into_iter().enumerate() {
                rows.push(
                    StatementRow::new("Q", company, year)
                        .with(Indicator::CurrentRatio, base + i as f64)
                        .with(Indicator::CurrentAssets, 100.0 * base)
                        .with(Indicator::CurrentLiabilities, 50.0 * base),
                );
            }
        }
        Dataset::new(rows)
    }

    fn request(min: i32, max: i32, viz: VizMode) -> DashboardRequest {
        DashboardRequest {
            filter: FilterSpec::new(Some("Q".into()), min, max),
            group: MetricGroup::Liquidez,
            viz,
            aggregation: Aggregation::Mean,
        }
    }

    fn panel<'a>(d: &'a Dashboard, title: &str) -> &'a Panel {
        d.panels.iter().find(|p| p.title == title).unwrap()
    }

    #[test]
    fn heatmap_falls_back_when_not_allowed() {
        let ds = dataset();
        let d = build_dashboard(&ds, &request(2019, 2021, VizMode::Heatmap)).unwrap();
        assert_eq!(panel(&d, "Liquidez corrente").mode, Some(RenderMode::Heatmap));
        // "Liquidez imediata" only offers Line or Bar.
        assert_eq!(panel(&d, "Liquidez imediata").mode, Some(RenderMode::Line));
    }

    #[test]
    fn bar_mode_uses_requested_aggregation() {
        let ds = dataset();
        let d = build_dashboard(&ds, &request(2019, 2021, VizMode::Bar)).unwrap();
        let p = panel(&d, "Liquidez corrente");
        assert_eq!(p.aggregation, Some(Aggregation::Mean));
        let PanelBody::Bar(bars) = &p.body else {
            panic!("expected bar body");
        };
        assert_eq!(bars[0].value, Some(2.0));
        assert_eq!(bars[1].value, Some(3.0));
    }

    #[test]
    fn empty_indicator_reports_no_data() {
        let ds = dataset();
        let d = build_dashboard(&ds, &request(2019, 2021, VizMode::Line)).unwrap();
        // Quick ratio is never populated in the fixture.
        assert_eq!(panel(&d, "Liquidez seca").body, PanelBody::NoData);
    }

    #[test]
    fn empty_working_set_is_all_no_data() {
        let ds = dataset();
        let d = build_dashboard(&ds, &request(2030, 2031, VizMode::Line)).unwrap();
        assert_eq!(d.rows, 0);
        assert_eq!(d.period_label, "-");
        assert!(d.panels.iter().all(|p| p.body == PanelBody::NoData));
    }

    #[test]
    fn inverted_range_fails_before_any_panel() {
        let ds = dataset();
        let err = build_dashboard(&ds, &request(2021, 2019, VizMode::Line)).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { .. }));
    }

    #[test]
    fn dashboard_serializes_with_tagged_bodies() {
        let ds = dataset();
        let d = build_dashboard(&ds, &request(2019, 2021, VizMode::Line)).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["group"], "LIQUIDEZ");
        assert_eq!(json["period_label"], "2019-2021");
        assert_eq!(json["panels"][0]["body"]["kind"], "grouped_bar");
    }
}
