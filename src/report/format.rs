//! Formatted terminal output for dashboards, groups and filter options.
//!
//! We keep formatting code in one place so:
//! - the filter/aggregation code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::{Dashboard, Panel, PanelBody};
use crate::catalog::{ChartKind, MetricGroup};
use crate::filter::FilterOptions;
use crate::plot;
use crate::viz::{GroupedBar, PieChart, RenderMode, TableData};

const PLOT_HEIGHT: usize = 12;

/// Format a full dashboard: header, then one section per panel.
pub fn format_dashboard(dashboard: &Dashboard, width: usize) -> String {
    let mut out = String::new();

    out.push_str("=== bvd - Bovespa Dashboard ===\n");
    out.push_str(&format!("Grupo: {}\n", dashboard.group));
    out.push_str(&format!(
        "Segmento: {}\n",
        dashboard.filter.segment.as_deref().unwrap_or("(todos)")
    ));
    out.push_str(&format!(
        "Período: {} | linhas={} | empresas={}\n",
        dashboard.period_label,
        dashboard.rows,
        dashboard.companies.len()
    ));
    if !dashboard.filter.companies.is_empty() {
        let names: Vec<&str> = dashboard.filter.companies.iter().map(String::as_str).collect();
        out.push_str(&format!("Empresas: {}\n", names.join(", ")));
    }

    for panel in &dashboard.panels {
        out.push('\n');
        out.push_str(&format_panel(panel, width));
    }

    out
}

/// Format a single panel section.
pub fn format_panel(panel: &Panel, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- {} [{}] ---\n", panel.title, panel_tag(panel)));

    match &panel.body {
        PanelBody::Bar(bars) => out.push_str(&plot::render_bars(bars, width / 2)),
        PanelBody::GroupedBar(g) => out.push_str(&format_grouped(g)),
        PanelBody::Line(series) => out.push_str(&plot::render_line_plot(series, width, PLOT_HEIGHT)),
        PanelBody::Heatmap(m) => out.push_str(&plot::render_heatmap(m)),
        PanelBody::Pie(pies) => out.push_str(&format_pies(pies)),
        PanelBody::Table(t) => out.push_str(&format_table(t)),
        PanelBody::NoData => out.push_str("  no data\n"),
    }

    out
}

/// Short description of how a panel was produced, e.g. `bar, mean`.
pub fn panel_tag(panel: &Panel) -> String {
    let shape = match (&panel.mode, &panel.body) {
        (Some(RenderMode::DegenerateBar), _) => "bar (single period)",
        (Some(RenderMode::Line), _) => "line",
        (Some(RenderMode::Heatmap), _) => "heatmap",
        (Some(RenderMode::Bar), _) => "bar",
        (None, PanelBody::GroupedBar(_)) => "grouped bar",
        (None, PanelBody::Pie(_)) => "pie",
        (None, PanelBody::Table(_)) => "table",
        (None, _) => "bar",
    };
    match panel.aggregation {
        Some(agg) => format!("{shape}, {}", agg.display_name().to_lowercase()),
        None => shape.to_string(),
    }
}

/// List every metric group with its chart titles.
pub fn format_groups() -> String {
    let mut out = String::new();
    for group in MetricGroup::ALL {
        out.push_str(&format!("{group}\n"));
        for chart in group.charts() {
            let kind = match chart.kind {
                ChartKind::Routed { allowed, .. } => {
                    let modes: Vec<&str> = allowed.iter().map(|m| m.display_name()).collect();
                    modes.join("/")
                }
                ChartKind::Total { .. } => "Total".to_string(),
                ChartKind::Grouped { .. } => "Grouped".to_string(),
                ChartKind::Composition { .. } => "Pie".to_string(),
                ChartKind::Table { .. } => "Table".to_string(),
            };
            out.push_str(&format!("  - {:<40} {kind}\n", chart.title));
        }
    }
    out
}

/// Selection choices for the control layer.
pub fn format_options(options: &FilterOptions, segment: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str("Segmentos:\n");
    for s in &options.segments {
        let mark = if Some(s.as_str()) == segment { "*" } else { " " };
        out.push_str(&format!("{mark} {s}\n"));
    }
    out.push_str(&format!(
        "\nEmpresas ({}):\n",
        segment.unwrap_or("todos os segmentos")
    ));
    for c in &options.companies {
        out.push_str(&format!("  {c}\n"));
    }
    match options.year_bounds {
        Some((lo, hi)) => out.push_str(&format!("\nAnos: {lo}-{hi}\n")),
        None => out.push_str("\nAnos: -\n"),
    }
    out
}

fn format_grouped(g: &GroupedBar) -> String {
    let mut out = String::new();
    let mut header = format!("{:<24}", "empresa");
    for s in &g.series {
        header.push_str(&format!(" {:>16}", truncate(s.header(), 16)));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for entry in &g.groups {
        let mut line = format!("{:<24}", truncate(&entry.company, 24));
        for v in &entry.values {
            line.push_str(&format!(" {:>16}", fmt_value(*v)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn format_pies(pies: &[PieChart]) -> String {
    let mut out = String::new();
    for pie in pies {
        out.push_str(&format!("{}:\n", pie.label));
        let total: f64 = pie.slices.iter().filter_map(|s| s.value).sum();
        for slice in &pie.slices {
            let share = match slice.value {
                Some(v) if total != 0.0 => format!("{:>6.1}%", 100.0 * v / total),
                _ => String::new(),
            };
            let line = format!(
                "  {:<28} {:>12} {share}",
                truncate(slice.part.header(), 28),
                fmt_value(slice.value)
            );
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
    out
}

fn format_table(t: &TableData) -> String {
    let mut out = String::new();
    let mut header = format!("{:<24} {:>6}", "empresa", "ano");
    for c in &t.columns {
        header.push_str(&format!(" {:>14}", truncate(c.header(), 14)));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let rule_len = 24 + 7 + 15 * t.columns.len();
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');

    for row in &t.rows {
        let mut line = format!("{:<24} {:>6}", truncate(&row.company, 24), row.period);
        for v in &row.values {
            line.push_str(&format!(" {:>14}", fmt_value(*v)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Format a value for display; missing values read "no data", never zero.
pub fn fmt_value(v: Option<f64>) -> String {
    let Some(v) = v else {
        return "no data".to_string();
    };
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else {
        format!("{v:.2}")
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{AxisRoles, DashboardRequest, build_dashboard};
    use crate::domain::{Dataset, Indicator, StatementRow};
    use crate::filter::FilterSpec;
    use crate::metrics::Aggregation;
    use crate::viz::{BarEntry, VizMode};

    #[test]
    fn fmt_value_never_renders_null_as_zero() {
        assert_eq!(fmt_value(None), "no data");
        assert_eq!(fmt_value(Some(0.0)), "0.00");
        assert_eq!(fmt_value(Some(1_500_000.0)), "1.50M");
        assert_eq!(fmt_value(Some(-2_000_000_000.0)), "-2.00B");
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("PETROBRAS", 20), "PETROBRAS");
        assert_eq!(truncate("PETROBRAS", 5), "PETR.");
    }

    #[test]
    fn degenerate_panel_is_tagged() {
        let panel = Panel {
            title: "ROE".into(),
            mode: Some(RenderMode::DegenerateBar),
            aggregation: None,
            roles: AxisRoles {
                category: "DENOM_CIA".into(),
                values: vec!["ROE".into()],
                group: None,
            },
            body: PanelBody::Bar(vec![BarEntry {
                company: "ALFA".into(),
                value: Some(1.0),
            }]),
        };
        assert_eq!(panel_tag(&panel), "bar (single period)");
        let txt = format_panel(&panel, 20);
        assert!(txt.starts_with("--- ROE [bar (single period)] ---\n"), "{txt}");
        assert!(txt.contains("ALFA |########## 1.00"), "{txt}");
    }

    #[test]
    fn dashboard_report_lists_every_panel() {
        let ds = Dataset::new(vec![
            StatementRow::new("Q", "ALFA SA", 2020).with(Indicator::ReturnOnEquity, 0.1),
            StatementRow::new("Q", "ALFA SA", 2021).with(Indicator::ReturnOnEquity, 0.2),
        ]);
        let request = DashboardRequest {
            filter: FilterSpec::new(Some("Q".into()), 2020, 2021),
            group: MetricGroup::Retorno,
            viz: VizMode::Bar,
            aggregation: Aggregation::Mean,
        };
        let d = build_dashboard(&ds, &request).unwrap();
        let txt = format_dashboard(&d, 40);
        assert!(txt.contains("Grupo: RETORNO"));
        assert!(txt.contains("Período: 2020-2021"));
        for chart in MetricGroup::Retorno.charts() {
            assert!(txt.contains(&format!("--- {} [", chart.title)), "{}", chart.title);
        }
        assert!(txt.contains("--- ROE [bar, mean] ---"), "{txt}");
        // ROA is never populated.
        assert!(txt.contains("--- ROA [bar, mean] ---\n  no data\n"), "{txt}");
    }

    #[test]
    fn groups_listing_covers_catalog() {
        let txt = format_groups();
        for g in MetricGroup::ALL {
            assert!(txt.contains(g.name()));
        }
        assert!(txt.contains("Line/Heatmap/Bar"));
    }
}
