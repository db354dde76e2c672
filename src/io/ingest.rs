//! CSV ingest and normalization.
//!
//! This module turns the statements CSV into a typed, period-sorted `Dataset`.
//!
//! Design goals:
//! - **Strict schema**: every known column must be present (extra columns are
//!   ignored)
//! - **Fail fast**: a malformed row aborts the load with its line number rather
//!   than being dropped or coerced to zero
//! - **Locale-aware numbers**: decimal separators are normalized before any
//!   arithmetic happens

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Dataset, Indicator, StatementRow};
use crate::error::AppError;

pub const SEGMENT_COLUMN: &str = "TIPO";
pub const COMPANY_COLUMN: &str = "DENOM_CIA";
pub const PERIOD_COLUMN: &str = "DT_FIM_EXERC";

/// How numeric cells encode decimals.
///
/// Cells that do not fit the chosen style (a second decimal mark, misplaced
/// thousands separators) are rejected rather than reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecimalStyle {
    /// `1.234,56`: `.` groups thousands, `,` marks decimals (pt-BR exports).
    Comma,
    /// `1,234.56`: `,` groups thousands, `.` marks decimals.
    #[default]
    Point,
}

/// Load the statements CSV at `path`.
pub fn load_dataset(path: &Path, style: DecimalStyle) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::data_load(format!("failed to open CSV '{}': {e}", path.display())))?;
    let dataset = load_from_reader(file, style)?;
    info!(
        path = %path.display(),
        rows = dataset.len(),
        "loaded statements"
    );
    Ok(dataset)
}

/// Load statements from any reader (used by tests and by `load_dataset`).
pub fn load_from_reader<R: Read>(reader: R, style: DecimalStyle) -> Result<Dataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data_load(format!("failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map)?;

    let mut rows = Vec::new();
    let mut seen: HashSet<(String, String, i32)> = HashSet::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and CSV lines are 1-based.
        let line = idx + 2;

        let record =
            result.map_err(|e| AppError::data_load(format!("line {line}: CSV parse error: {e}")))?;

        if record.len() != headers.len() {
            return Err(AppError::data_load(format!(
                "line {line}: expected {} fields, found {}",
                headers.len(),
                record.len()
            )));
        }

        let row = parse_row(&record, &columns, style)
            .map_err(|message| AppError::data_load(format!("line {line}: {message}")))?;

        let key = (row.segment.clone(), row.company_name.clone(), row.period_end);
        if !seen.insert(key) {
            return Err(AppError::data_load(format!(
                "line {line}: duplicate statement for '{}' in {} (segment '{}')",
                row.company_name, row.period_end, row.segment
            )));
        }

        rows.push(row);
    }

    debug!(rows = rows.len(), "parsed statement rows");
    Ok(Dataset::new(rows))
}

/// Column positions for every field the dashboard reads.
struct ColumnIndex {
    segment: usize,
    company: usize,
    period: usize,
    indicators: Vec<(Indicator, usize)>,
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_uppercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<ColumnIndex, AppError> {
    let require = |name: &str| {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| AppError::data_load(format!("missing required column: `{name}`")))
    };

    let mut indicators = Vec::with_capacity(Indicator::STORED.len());
    for indicator in Indicator::STORED {
        indicators.push((indicator, require(indicator.header())?));
    }

    Ok(ColumnIndex {
        segment: require(SEGMENT_COLUMN)?,
        company: require(COMPANY_COLUMN)?,
        period: require(PERIOD_COLUMN)?,
        indicators,
    })
}

fn parse_row(record: &StringRecord, columns: &ColumnIndex, style: DecimalStyle) -> Result<StatementRow, String> {
    let segment = get_required(record, columns.segment, SEGMENT_COLUMN)?;
    let company = get_required(record, columns.company, COMPANY_COLUMN)?;
    let period = parse_period(get_required(record, columns.period, PERIOD_COLUMN)?)?;

    let mut row = StatementRow::new(segment, company, period);
    for &(indicator, idx) in &columns.indicators {
        let raw = record.get(idx).unwrap_or("");
        let value = parse_number(raw, style)
            .map_err(|e| format!("column `{}`: {e}", indicator.header()))?;
        row.set(indicator, value);
    }

    Ok(row)
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing required value: `{name}`"))
}

/// Fiscal year from either a bare year (`2021`) or a full date.
fn parse_period(s: &str) -> Result<i32, String> {
    if let Ok(year) = s.parse::<i32>() {
        return Ok(year);
    }
    const FMTS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.year());
        }
    }
    Err(format!(
        "invalid period '{s}'. Expected a year (YYYY) or a date (YYYY-MM-DD, DD/MM/YYYY, YYYY/MM/DD)."
    ))
}

/// Parse a numeric cell. Empty cells and a lone `-` are null.
pub fn parse_number(raw: &str, style: DecimalStyle) -> Result<Option<f64>, String> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return Ok(None);
    }

    let normalized = normalize_decimal(s, style)
        .map_err(|reason| format!("invalid number '{s}': {reason} for --decimal {}", style.flag()))?;
    let v = normalized
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{s}'"))?;
    if !v.is_finite() {
        return Err(format!("non-finite number '{s}'"));
    }
    Ok(Some(v))
}

impl DecimalStyle {
    fn flag(self) -> &'static str {
        match self {
            DecimalStyle::Comma => "comma",
            DecimalStyle::Point => "point",
        }
    }

    /// `(thousands separator, decimal mark)`.
    fn separators(self) -> (char, char) {
        match self {
            DecimalStyle::Comma => ('.', ','),
            DecimalStyle::Point => (',', '.'),
        }
    }
}

/// Rewrite `s` into Rust float syntax. Thousands separators must sit between
/// groups of exactly three digits, and the fraction may not contain either mark.
fn normalize_decimal(s: &str, style: DecimalStyle) -> Result<String, &'static str> {
    let (group, decimal) = style.separators();
    let (int_part, frac) = match s.split_once(decimal) {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (s, None),
    };
    if frac.is_some_and(|f| f.contains([group, decimal])) {
        return Err("separator after the decimal mark");
    }

    let unsigned = int_part.trim_start_matches(['-', '+']);
    let sign = &int_part[..int_part.len() - unsigned.len()];
    let digits = if unsigned.contains(group) {
        let mut groups = unsigned.split(group);
        let head_ok = groups.next().is_some_and(|g| (1..=3).contains(&g.len()));
        if !head_ok || !groups.all(|g| g.len() == 3) {
            return Err("misplaced thousands separator");
        }
        unsigned.replace(group, "")
    } else {
        unsigned.to_string()
    };

    Ok(match frac {
        Some(frac) => format!("{sign}{digits}.{frac}"),
        None => format!("{sign}{digits}"),
    })
}
