//! Filter pipeline: segment, year range, and company subset.
//!
//! All predicates are independent conjunctions; they are applied in a fixed
//! order (segment, years, companies) only to keep the mental model simple.
//! The output borrows from the input and preserves its order.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Dataset, StatementRow};
use crate::error::AppError;

/// User-selected filters, rebuilt on every interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub segment: Option<String>,
    /// Inclusive `(min_year, max_year)`.
    pub year_range: (i32, i32),
    /// Empty means "all companies".
    pub companies: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new(segment: Option<String>, min_year: i32, max_year: i32) -> Self {
        Self {
            segment,
            year_range: (min_year, max_year),
            companies: BTreeSet::new(),
        }
    }

    pub fn with_companies<I, S>(mut self, companies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.companies = companies.into_iter().map(Into::into).collect();
        self
    }

    /// Clamp the year range into `bounds` the way the selection controls do:
    /// the lower bound is clamped first, then the upper bound is forced to be
    /// at least the lower bound.
    pub fn clamped_to(mut self, bounds: (i32, i32)) -> Self {
        let (lo, hi) = bounds;
        let min = self.year_range.0.clamp(lo, hi);
        let max = self.year_range.1.clamp(min, hi.max(min));
        self.year_range = (min, max);
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let (min, max) = self.year_range;
        if min > max {
            return Err(AppError::InvalidRange { min, max });
        }
        Ok(())
    }

    /// Does a single row satisfy all three predicates?
    pub fn matches(&self, row: &StatementRow) -> bool {
        let (min, max) = self.year_range;
        if let Some(segment) = &self.segment {
            if row.segment != *segment {
                return false;
            }
        }
        if row.period_end < min || row.period_end > max {
            return false;
        }
        self.companies.is_empty() || self.companies.contains(&row.company_name)
    }

    /// Apply the filter to any sequence of rows.
    ///
    /// The range is re-validated here even though the controls clamp it,
    /// since the pipeline does not trust caller state.
    pub fn apply<'a, I>(&self, rows: I) -> Result<WorkingSet<'a>, AppError>
    where
        I: IntoIterator<Item = &'a StatementRow>,
    {
        self.validate()?;
        let rows: Vec<&'a StatementRow> = rows.into_iter().filter(|r| self.matches(r)).collect();
        debug!(
            segment = ?self.segment,
            min_year = self.year_range.0,
            max_year = self.year_range.1,
            companies = self.companies.len(),
            kept = rows.len(),
            "applied filter"
        );
        Ok(WorkingSet { rows })
    }
}

/// The dataset after applying a `FilterSpec`. Borrowed, never copied.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet<'a> {
    rows: Vec<&'a StatementRow>,
}

impl<'a> WorkingSet<'a> {
    pub fn rows(&self) -> &[&'a StatementRow] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a StatementRow> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct periods, ascending.
    pub fn distinct_periods(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.rows.iter().map(|r| r.period_end).collect();
        set.into_iter().collect()
    }

    /// Company names in order of first appearance.
    pub fn companies(&self) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| r.company_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Narrow an existing working set further.
    pub fn refilter(&self, spec: &FilterSpec) -> Result<WorkingSet<'a>, AppError> {
        spec.apply(self.iter())
    }
}

/// Choices available to the selection controls for a given segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// All segments, reverse order of first appearance in the source file.
    pub segments: Vec<String>,
    /// Companies within the selected segment (or all, if none selected).
    pub companies: Vec<String>,
    /// Period bounds within the selected segment.
    pub year_bounds: Option<(i32, i32)>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset, segment: Option<&str>) -> Self {
        // File order, not period order; the last-listed segment comes first.
        let segments: Vec<String> = dataset.segments().iter().rev().cloned().collect();

        let in_segment = |r: &&StatementRow| segment.is_none_or(|s| r.segment == s);

        let mut seen = HashSet::new();
        let companies = dataset
            .rows()
            .iter()
            .filter(in_segment)
            .filter(|r| seen.insert(r.company_name.as_str()))
            .map(|r| r.company_name.clone())
            .collect();

        let mut years = dataset.rows().iter().filter(in_segment).map(|r| r.period_end);
        let year_bounds = years.next().map(|first| {
            years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)))
        });

        Self {
            segments,
            companies,
            year_bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            StatementRow::new("Q", "ALFA SA", 2019),
            StatementRow::new("Q", "BETA SA", 2019),
            StatementRow::new("Q", "ALFA SA", 2020),
            StatementRow::new("Q", "BETA SA", 2020),
            StatementRow::new("V", "GAMA SA", 2020),
            StatementRow::new("Q", "ALFA SA", 2021),
            StatementRow::new("V", "GAMA SA", 2022),
        ])
    }

    fn specs() -> Vec<FilterSpec> {
        vec![
            FilterSpec::new(None, 2000, 2100),
            FilterSpec::new(Some("Q".into()), 2019, 2021),
            FilterSpec::new(Some("Q".into()), 2020, 2020),
            FilterSpec::new(None, 2020, 2022).with_companies(["GAMA SA", "ALFA SA"]),
            FilterSpec::new(Some("V".into()), 2019, 2019),
            FilterSpec::new(Some("missing".into()), 2019, 2022),
        ]
    }

    #[test]
    fn output_is_an_ordered_subset_satisfying_every_predicate() {
        let ds = dataset();
        for spec in specs() {
            let ws = spec.apply(ds.rows()).unwrap();
            for row in ws.iter() {
                assert!(ds.rows().iter().any(|r| std::ptr::eq(r, row)));
                assert!(spec.matches(row));
            }
            let periods: Vec<i32> = ws.iter().map(|r| r.period_end).collect();
            assert!(periods.windows(2).all(|w| w[0] <= w[1]));
            let expected = ds.rows().iter().filter(|r| spec.matches(r)).count();
            assert_eq!(ws.len(), expected);
        }
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let ds = dataset();
        for spec in specs() {
            let once = spec.apply(ds.rows()).unwrap();
            let twice = once.refilter(&spec).unwrap();
            assert_eq!(once.len(), twice.len());
            for (a, b) in once.iter().zip(twice.iter()) {
                assert!(std::ptr::eq(a, b));
            }
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let ds = dataset();
        let err = FilterSpec::new(None, 2021, 2019).apply(ds.rows()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRange { min: 2021, max: 2019 }));
    }

    #[test]
    fn empty_company_set_means_all() {
        let ds = dataset();
        let ws = FilterSpec::new(Some("Q".into()), 2019, 2021).apply(ds.rows()).unwrap();
        assert_eq!(ws.len(), 5);
        assert_eq!(ws.companies(), ["ALFA SA", "BETA SA"]);
        assert_eq!(ws.distinct_periods(), [2019, 2020, 2021]);
    }

    #[test]
    fn clamping_follows_the_controls() {
        let spec = FilterSpec::new(None, 2010, 2030).clamped_to((2019, 2022));
        assert_eq!(spec.year_range, (2019, 2022));

        let spec = FilterSpec::new(None, 2021, 2019).clamped_to((2019, 2022));
        assert_eq!(spec.year_range, (2021, 2021));
    }

    #[test]
    fn options_follow_selected_segment() {
        let ds = dataset();
        let all = FilterOptions::from_dataset(&ds, None);
        assert_eq!(all.segments, ["V", "Q"]);
        assert_eq!(all.year_bounds, Some((2019, 2022)));

        let v = FilterOptions::from_dataset(&ds, Some("V"));
        assert_eq!(v.companies, ["GAMA SA"]);
        assert_eq!(v.year_bounds, Some((2020, 2022)));

        let none = FilterOptions::from_dataset(&ds, Some("missing"));
        assert!(none.companies.is_empty());
        assert_eq!(none.year_bounds, None);
    }

    #[test]
    fn segment_listing_uses_file_order_not_period_order() {
        // "V" appears first in the file but only reports later years.
        let ds = Dataset::new(vec![
            StatementRow::new("V", "GAMA SA", 2022),
            StatementRow::new("Q", "ALFA SA", 2019),
        ]);
        let options = FilterOptions::from_dataset(&ds, None);
        assert_eq!(options.segments, ["Q", "V"]);
    }
}
