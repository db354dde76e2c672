//! Aggregation dispatch: a closed set of named reductions over nullable values.

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Reduction applied to a group of indicator values.
///
/// Every reduction ignores nulls and yields `None` when nothing is left, so an
/// empty group is reported as "no data" rather than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
    #[value(name = "min")]
    Minimum,
    #[value(name = "max")]
    Maximum,
    Median,
    /// Sample standard deviation (n - 1 denominator).
    #[value(name = "std-dev")]
    StdDev,
}

impl Aggregation {
    pub const ALL: [Aggregation; 6] = [
        Aggregation::Sum,
        Aggregation::Mean,
        Aggregation::Minimum,
        Aggregation::Maximum,
        Aggregation::Median,
        Aggregation::StdDev,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Aggregation::Sum => "Sum",
            Aggregation::Mean => "Mean",
            Aggregation::Minimum => "Minimum",
            Aggregation::Maximum => "Maximum",
            Aggregation::Median => "Median",
            Aggregation::StdDev => "Standard deviation",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&a| a == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&a| a == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Reduce a group of nullable values.
    pub fn reduce(self, values: &[Option<f64>]) -> Option<f64> {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        let n = present.len() as f64;

        match self {
            Aggregation::Sum => Some(present.iter().sum()),
            Aggregation::Mean => Some(present.iter().sum::<f64>() / n),
            Aggregation::Minimum => present.iter().copied().reduce(f64::min),
            Aggregation::Maximum => present.iter().copied().reduce(f64::max),
            Aggregation::Median => median_mut(&mut present),
            Aggregation::StdDev => {
                if present.len() < 2 {
                    return None;
                }
                let mean = present.iter().sum::<f64>() / n;
                let ss: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
                Some((ss / (n - 1.0)).sqrt())
            }
        }
    }
}

impl FromStr for Aggregation {
    type Err = AppError;

    /// Accepts display names, CLI value names, and the Portuguese labels used
    /// on the dashboard controls. Matching is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let agg = match key.as_str() {
            "sum" | "soma" => Aggregation::Sum,
            "mean" | "average" | "média" | "media" => Aggregation::Mean,
            "minimum" | "min" | "mínimo" | "minimo" => Aggregation::Minimum,
            "maximum" | "max" | "máximo" | "maximo" => Aggregation::Maximum,
            "median" | "mediana" => Aggregation::Median,
            "standard deviation" | "std-dev" | "stddev" | "desvio padrão" | "desvio padrao" => {
                Aggregation::StdDev
            }
            _ => return Err(AppError::InvalidAggregation(s.to_string())),
        };
        Ok(agg)
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some(0.5 * (values[mid - 1] + values[mid]))
    }
}
