//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - bars: `#` (positive) / `~` (negative), scaled to the largest magnitude
//! - lines: one marker letter per company, joined by `.`
//! - heatmap: shade ramp from `.` (low) to `@` (high), blank when missing

use crate::report::{fmt_value, truncate};
use crate::viz::{BarEntry, HeatmapMatrix, LineSeries};

const MARKERS: &[char] = &['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L'];
const SHADES: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];
const LABEL_MAX: usize = 24;

/// Horizontal bar chart, one line per company.
pub fn render_bars(entries: &[BarEntry], bar_width: usize) -> String {
    let bar_width = bar_width.max(5);
    let label_w = entries
        .iter()
        .map(|e| e.company.chars().count().min(LABEL_MAX))
        .max()
        .unwrap_or(0);
    let max_abs = entries
        .iter()
        .filter_map(|e| e.value)
        .map(f64::abs)
        .fold(0.0_f64, f64::max);

    let mut out = String::new();
    for e in entries {
        let label = truncate(&e.company, LABEL_MAX);
        let line = match e.value {
            Some(v) => {
                let len = if max_abs > 0.0 {
                    ((v.abs() / max_abs) * bar_width as f64).round() as usize
                } else {
                    0
                };
                let ch = if v < 0.0 { '~' } else { '#' };
                let bar: String = std::iter::repeat_n(ch, len).collect();
                format!("{label:<label_w$} |{bar} {}", fmt_value(Some(v)))
            }
            None => format!("{label:<label_w$} | {}", fmt_value(None)),
        };
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Value-vs-period plot with one marker per company.
pub fn render_line_plot(series: &[LineSeries], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((p_min, p_max)) = period_range(series) else {
        return String::new();
    };
    let Some((y_min, y_max)) = y_range(series) else {
        return String::new();
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);
    let (t_min, t_max) = if p_max > p_min {
        (p_min as f64, p_max as f64)
    } else {
        (p_min as f64 - 0.5, p_max as f64 + 0.5)
    };

    let mut grid = vec![vec![' '; width]; height];

    let mapped: Vec<Vec<(usize, usize)>> = series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .filter_map(|&(p, v)| v.map(|v| (map_x(p as f64, t_min, t_max, width), map_y(v, y_min, y_max, height))))
                .collect()
        })
        .collect();

    // Connectors first so markers overlay them.
    for points in &mapped {
        for pair in points.windows(2) {
            draw_line(&mut grid, pair[0].0, pair[0].1, pair[1].0, pair[1].1, '.');
        }
    }
    for (i, points) in mapped.iter().enumerate() {
        let marker = MARKERS[i % MARKERS.len()];
        for &(x, y) in points {
            grid[y][x] = marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: period=[{p_min}, {p_max}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    for (i, s) in series.iter().enumerate() {
        out.push_str(&format!("  {} {}\n", MARKERS[i % MARKERS.len()], s.company));
    }
    out
}

/// Company x period shade matrix.
pub fn render_heatmap(matrix: &HeatmapMatrix) -> String {
    let label_w = matrix
        .companies
        .iter()
        .map(|c| c.chars().count().min(LABEL_MAX))
        .max()
        .unwrap_or(0);

    let (lo, hi) = matrix
        .cells
        .iter()
        .flatten()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let mut out = String::new();
    let header: String = matrix.periods.iter().map(|p| format!("{p:<5}")).collect();
    out.push_str(format!("{:<label_w$} {header}", "").trim_end());
    out.push('\n');

    for (company, row) in matrix.companies.iter().zip(&matrix.cells) {
        let cells: String = row
            .iter()
            .map(|v| {
                let ch = v.map(|v| shade(v, lo, hi)).unwrap_or(' ');
                format!("{} ", std::iter::repeat_n(ch, 4).collect::<String>())
            })
            .collect();
        out.push_str(format!("{:<label_w$} {cells}", truncate(company, LABEL_MAX)).trim_end());
        out.push('\n');
    }

    if lo.is_finite() && hi.is_finite() {
        out.push_str(&format!(
            "scale: {} ({}) .. {} ({})\n",
            SHADES[0],
            fmt_value(Some(lo)),
            SHADES[SHADES.len() - 1],
            fmt_value(Some(hi))
        ));
    }
    out
}

fn shade(v: f64, lo: f64, hi: f64) -> char {
    let top = SHADES.len() - 1;
    if hi <= lo {
        return SHADES[top];
    }
    let u = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    SHADES[(u * top as f64).round() as usize]
}

fn period_range(series: &[LineSeries]) -> Option<(i32, i32)> {
    let mut periods = series.iter().flat_map(|s| &s.points).map(|&(p, _)| p);
    let first = periods.next()?;
    Some(periods.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
}

fn y_range(series: &[LineSeries]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for v in series.iter().flat_map(|s| &s.points).filter_map(|&(_, v)| v) {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }
    (min_y.is_finite() && max_y.is_finite()).then_some((min_y, max_y))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { min.abs().max(1.0) * frac };
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|row| row.get_mut(x0 as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(company: &str, value: Option<f64>) -> BarEntry {
        BarEntry {
            company: company.to_string(),
            value,
        }
    }

    #[test]
    fn bars_golden_snapshot_small() {
        let txt = render_bars(
            &[bar("ALFA", Some(10.0)), bar("BETA", Some(-5.0)), bar("GAMA", None)],
            10,
        );
        let expected = concat!(
            "ALFA |########## 10.00\n",
            "BETA |~~~~~ -5.00\n",
            "GAMA | no data\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn line_plot_puts_extremes_in_corners() {
        let series = vec![LineSeries {
            company: "ALFA SA".into(),
            points: vec![(2019, Some(0.0)), (2020, None), (2021, Some(10.0))],
        }];
        let txt = render_line_plot(&series, 10, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[0].starts_with("Plot: period=[2019, 2021]"));
        assert!(lines[1].ends_with('A'), "{txt}");
        assert!(lines[5].starts_with('A'), "{txt}");
        assert_eq!(lines[6], "  A ALFA SA");
    }

    #[test]
    fn line_plot_without_values_is_empty() {
        let series = vec![LineSeries {
            company: "ALFA SA".into(),
            points: vec![(2019, None)],
        }];
        assert!(render_line_plot(&series, 10, 5).is_empty());
    }

    #[test]
    fn heatmap_shades_by_value_and_blanks_missing() {
        let m = HeatmapMatrix {
            companies: vec!["ALFA".into(), "BETA".into()],
            periods: vec![2019, 2020],
            cells: vec![vec![Some(0.0), Some(10.0)], vec![None, Some(5.0)]],
        };
        let txt = render_heatmap(&m);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "     2019 2020");
        assert_eq!(lines[1], "ALFA .... @@@@");
        assert_eq!(lines[2], "BETA      ++++");
        assert!(lines[3].starts_with("scale:"));
    }
}
