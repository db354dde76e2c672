//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - held in the in-memory dataset for the whole session
//! - projected by the filter pipeline without copying
//! - exported to JSON alongside computed panels

use serde::{Deserialize, Serialize};

use super::indicator::{Indicator, STORED_COUNT};

/// One company's financial statement for one fiscal period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    /// Industry grouping (source column `TIPO`).
    pub segment: String,
    /// Company name (source column `DENOM_CIA`).
    pub company_name: String,
    /// Fiscal year end (source column `DT_FIM_EXERC`).
    pub period_end: i32,
    /// Stored indicators, indexed by `Indicator::stored_index`.
    pub values: [Option<f64>; STORED_COUNT],
}

impl StatementRow {
    /// A row with every indicator null.
    pub fn new(segment: impl Into<String>, company_name: impl Into<String>, period_end: i32) -> Self {
        Self {
            segment: segment.into(),
            company_name: company_name.into(),
            period_end,
            values: [None; STORED_COUNT],
        }
    }

    /// Builder-style setter. Derived indicators are ignored.
    pub fn with(mut self, indicator: Indicator, value: f64) -> Self {
        self.set(indicator, Some(value));
        self
    }

    pub fn set(&mut self, indicator: Indicator, value: Option<f64>) {
        if let Some(idx) = indicator.stored_index() {
            self.values[idx] = value;
        }
    }

    /// Raw stored value. Use `Indicator::value` to include derived indicators.
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        indicator.stored_index().and_then(|idx| self.values[idx])
    }
}

/// The loaded statement table, sorted ascending by `period_end`.
///
/// Immutable after construction: every downstream view borrows from it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<StatementRow>,
    /// Distinct segments in order of first appearance in the source.
    segments: Vec<String>,
}

impl Dataset {
    /// Build a dataset, stable-sorting rows by period so that rows of the same
    /// year keep their source order.
    pub fn new(mut rows: Vec<StatementRow>) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for row in &rows {
            if !segments.contains(&row.segment) {
                segments.push(row.segment.clone());
            }
        }
        rows.sort_by_key(|r| r.period_end);
        Self { rows, segments }
    }

    pub fn rows(&self) -> &[StatementRow] {
        &self.rows
    }

    /// Segments in source order, before the period sort.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Smallest and largest period in the dataset.
    pub fn period_bounds(&self) -> Option<(i32, i32)> {
        let first = self.rows.first()?.period_end;
        let last = self.rows.last()?.period_end;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_sorts_by_period_and_keeps_ties_stable() {
        let ds = Dataset::new(vec![
            StatementRow::new("Q", "B", 2021),
            StatementRow::new("Q", "A", 2019),
            StatementRow::new("Q", "C", 2021),
            StatementRow::new("Q", "D", 2020),
        ]);
        let order: Vec<&str> = ds.rows().iter().map(|r| r.company_name.as_str()).collect();
        assert_eq!(order, ["A", "D", "B", "C"]);
        assert_eq!(ds.period_bounds(), Some((2019, 2021)));
    }

    #[test]
    fn segments_keep_source_order() {
        let ds = Dataset::new(vec![
            StatementRow::new("V", "B", 2022),
            StatementRow::new("Q", "A", 2019),
            StatementRow::new("V", "C", 2019),
        ]);
        assert_eq!(ds.rows()[0].segment, "Q");
        assert_eq!(ds.segments(), ["V", "Q"]);
    }

    #[test]
    fn setting_a_derived_indicator_is_a_no_op() {
        let row = StatementRow::new("Q", "A", 2020).with(Indicator::WorkingCapital, 1.0);
        assert!(row.values.iter().all(Option::is_none));
    }
}
