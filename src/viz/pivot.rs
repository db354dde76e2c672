//! Reshape a working subset into renderer-ready tables.
//!
//! Every function here is a pure projection of the working subset. Company
//! order is first-seen order in the subset (which is period-sorted), periods
//! are ascending, and null values are carried through as `None`.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::Indicator;
use crate::error::AppError;
use crate::filter::WorkingSet;
use crate::metrics::Aggregation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarEntry {
    pub company: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedBar {
    /// One bar per indicator within each company group.
    pub series: Vec<Indicator>,
    pub groups: Vec<GroupedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedEntry {
    pub company: String,
    /// Aligned with `GroupedBar::series`.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub company: String,
    pub points: Vec<(i32, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapMatrix {
    pub companies: Vec<String>,
    pub periods: Vec<i32>,
    /// `cells[company][period]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieChart {
    pub company: String,
    /// Short display label (first two words of the company name).
    pub label: String,
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub part: Indicator,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<Indicator>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub company: String,
    pub period: i32,
    pub values: Vec<Option<f64>>,
}

impl HeatmapMatrix {
    pub fn has_values(&self) -> bool {
        self.cells.iter().flatten().any(Option::is_some)
    }
}

impl GroupedBar {
    pub fn has_values(&self) -> bool {
        self.groups.iter().flat_map(|g| &g.values).any(Option::is_some)
    }
}

/// Values of one indicator, grouped by company in first-seen order.
fn group_by_company(ws: &WorkingSet<'_>, indicator: Indicator) -> Vec<(String, Vec<Option<f64>>)> {
    let mut groups: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for row in ws.iter() {
        let idx = *index.entry(row.company_name.as_str()).or_insert_with(|| {
            groups.push((row.company_name.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(indicator.value(row));
    }
    groups
}

/// One aggregated value per company.
pub fn bar_by_company(ws: &WorkingSet<'_>, indicator: Indicator, agg: Aggregation) -> Vec<BarEntry> {
    group_by_company(ws, indicator)
        .into_iter()
        .map(|(company, values)| BarEntry {
            company,
            value: agg.reduce(&values),
        })
        .collect()
}

/// One aggregated value per (company, indicator).
pub fn grouped_bar(ws: &WorkingSet<'_>, indicators: &[Indicator], agg: Aggregation) -> GroupedBar {
    let per_indicator: Vec<Vec<BarEntry>> = indicators
        .iter()
        .map(|&ind| bar_by_company(ws, ind, agg))
        .collect();

    let groups = ws
        .companies()
        .into_iter()
        .enumerate()
        .map(|(ci, company)| GroupedEntry {
            company: company.to_string(),
            values: per_indicator.iter().map(|bars| bars[ci].value).collect(),
        })
        .collect();

    GroupedBar {
        series: indicators.to_vec(),
        groups,
    }
}

/// One series per company, points ordered by period.
pub fn line_series(ws: &WorkingSet<'_>, indicator: Indicator) -> Vec<LineSeries> {
    let mut series: Vec<LineSeries> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for row in ws.iter() {
        let idx = *index.entry(row.company_name.as_str()).or_insert_with(|| {
            series.push(LineSeries {
                company: row.company_name.clone(),
                points: Vec::new(),
            });
            series.len() - 1
        });
        series[idx].points.push((row.period_end, indicator.value(row)));
    }
    for s in &mut series {
        s.points.sort_by_key(|&(period, _)| period);
    }
    series
}

/// Pivot into a company x period matrix.
///
/// Two rows for the same (company, period) violate the dataset invariant and
/// fail with `DuplicateKey` instead of overwriting.
pub fn heatmap(ws: &WorkingSet<'_>, indicator: Indicator) -> Result<HeatmapMatrix, AppError> {
    let periods: Vec<i32> = ws.distinct_periods();
    let period_col: HashMap<i32, usize> = periods.iter().enumerate().map(|(i, &p)| (p, i)).collect();

    let companies: Vec<String> = ws.companies().into_iter().map(str::to_string).collect();
    let company_row: HashMap<&str, usize> = companies
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut cells = vec![vec![None; periods.len()]; companies.len()];
    let mut filled: BTreeSet<(usize, usize)> = BTreeSet::new();

    for row in ws.iter() {
        let r = company_row[row.company_name.as_str()];
        let c = period_col[&row.period_end];
        if !filled.insert((r, c)) {
            return Err(AppError::DuplicateKey {
                company: row.company_name.clone(),
                period: row.period_end,
            });
        }
        cells[r][c] = indicator.value(row);
    }

    Ok(HeatmapMatrix {
        companies,
        periods,
        cells,
    })
}

/// Per-company composition of summed parts (pie slices).
pub fn composition(ws: &WorkingSet<'_>, parts: &[Indicator]) -> Vec<PieChart> {
    let grouped = grouped_bar(ws, parts, Aggregation::Sum);
    grouped
        .groups
        .into_iter()
        .map(|g| PieChart {
            label: short_company_label(&g.company),
            slices: parts
                .iter()
                .zip(g.values)
                .map(|(&part, value)| PieSlice { part, value })
                .collect(),
            company: g.company,
        })
        .collect()
}

/// Raw rows projected onto `columns`.
pub fn table(ws: &WorkingSet<'_>, columns: &[Indicator]) -> TableData {
    let rows = ws
        .iter()
        .map(|row| TableRow {
            company: row.company_name.clone(),
            period: row.period_end,
            values: columns.iter().map(|c| c.value(row)).collect(),
        })
        .collect();
    TableData {
        columns: columns.to_vec(),
        rows,
    }
}

/// First two words of a company name, used where space is tight.
pub fn short_company_label(company: &str) -> String {
    company.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, StatementRow};
    use crate::filter::FilterSpec;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            StatementRow::new("Q", "ALFA INDUSTRIA SA", 2019).with(Indicator::NetRevenue, 10.0),
            StatementRow::new("Q", "BETA COMERCIO SA", 2019).with(Indicator::NetRevenue, 100.0),
            StatementRow::new("Q", "ALFA INDUSTRIA SA", 2020).with(Indicator::NetRevenue, 20.0),
            StatementRow::new("Q", "ALFA INDUSTRIA SA", 2021),
            StatementRow::new("Q", "BETA COMERCIO SA", 2021).with(Indicator::NetRevenue, 300.0),
        ])
    }

    fn all(ds: &Dataset) -> WorkingSet<'_> {
        FilterSpec::new(None, 2019, 2021).apply(ds.rows()).unwrap()
    }

    #[test]
    fn bar_aggregates_per_company() {
        let ds = dataset();
        let bars = bar_by_company(&all(&ds), Indicator::NetRevenue, Aggregation::Sum);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].company, "ALFA INDUSTRIA SA");
        assert_eq!(bars[0].value, Some(30.0));
        assert_eq!(bars[1].value, Some(400.0));
    }

    #[test]
    fn heatmap_leaves_missing_cells_null() {
        let ds = dataset();
        let m = heatmap(&all(&ds), Indicator::NetRevenue).unwrap();
        assert_eq!(m.periods, [2019, 2020, 2021]);
        assert_eq!(m.cells[0], [Some(10.0), Some(20.0), None]);
        assert_eq!(m.cells[1], [Some(100.0), None, Some(300.0)]);
        assert!(m.has_values());
    }

    #[test]
    fn heatmap_rejects_duplicate_cells() {
        let ds = Dataset::new(vec![
            StatementRow::new("Q", "ALFA", 2019).with(Indicator::NetRevenue, 1.0),
            StatementRow::new("V", "ALFA", 2019).with(Indicator::NetRevenue, 2.0),
        ]);
        let err = heatmap(&all(&ds), Indicator::NetRevenue).unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { period: 2019, .. }));
    }

    #[test]
    fn line_series_keeps_gaps() {
        let ds = dataset();
        let series = line_series(&all(&ds), Indicator::NetRevenue);
        assert_eq!(series[0].points, [(2019, Some(10.0)), (2020, Some(20.0)), (2021, None)]);
        assert_eq!(series[1].points, [(2019, Some(100.0)), (2021, Some(300.0))]);
    }

    #[test]
    fn grouped_bar_aligns_with_series() {
        let ds = Dataset::new(vec![
            StatementRow::new("Q", "ALFA", 2019)
                .with(Indicator::CurrentAssets, 5.0)
                .with(Indicator::CurrentLiabilities, 3.0),
            StatementRow::new("Q", "ALFA", 2020).with(Indicator::CurrentAssets, 7.0),
        ]);
        let g = grouped_bar(
            &all(&ds),
            &[Indicator::CurrentAssets, Indicator::CurrentLiabilities],
            Aggregation::Sum,
        );
        assert_eq!(g.groups[0].values, [Some(12.0), Some(3.0)]);
    }

    #[test]
    fn composition_uses_short_labels() {
        let ds = dataset();
        let pies = composition(&all(&ds), &[Indicator::NetRevenue]);
        assert_eq!(pies[1].label, "BETA COMERCIO");
        assert_eq!(pies[1].slices[0].value, Some(400.0));
    }

    #[test]
    fn table_projects_rows_in_order() {
        let ds = dataset();
        let t = table(&all(&ds), &[Indicator::NetRevenue, Indicator::WorkingCapital]);
        assert_eq!(t.rows.len(), 5);
        assert_eq!(t.rows[0].values, [Some(10.0), None]);
        assert_eq!(t.rows[4].period, 2021);
    }
}
