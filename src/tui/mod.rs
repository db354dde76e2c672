//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing segment, companies, year
//! range, metric group, visualization and aggregation, then renders the group's
//! panels one at a time. Every settings change recomputes the dashboard from the
//! cached dataset.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table},
};

use crate::app::pipeline::{Dashboard, DashboardRequest, Panel, PanelBody, build_dashboard};
use crate::catalog::MetricGroup;
use crate::cli::TuiArgs;
use crate::domain::Dataset;
use crate::error::AppError;
use crate::filter::{FilterOptions, FilterSpec};
use crate::metrics::Aggregation;
use crate::report::{fmt_value, panel_tag, truncate};
use crate::viz::{LineSeries, VizMode};

mod plotters_chart;

use plotters_chart::{PanelLineChart, legend_color};

const FIELD_SEGMENT: usize = 0;
const FIELD_COMPANY: usize = 1;
const FIELD_FROM: usize = 2;
const FIELD_TO: usize = 3;
const FIELD_GROUP: usize = 4;
const FIELD_VIZ: usize = 5;
const FIELD_AGG: usize = 6;
const FIELD_COUNT: usize = 7;

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    // Load before touching the terminal so load errors print normally.
    let cache = crate::app::open_cache(&args.data);
    let dataset = cache.get()?;
    let filter = crate::app::filter_from_args(dataset, &args.filter);

    let mut app = App::new(dataset, &args, filter);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::Terminal(format!("failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::Terminal(format!("failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::Terminal(format!("failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App<'a> {
    dataset: &'a Dataset,
    segments: Vec<String>,
    /// Index into `segments`; `segments.len()` means "all segments".
    segment_idx: usize,
    year_bounds: Option<(i32, i32)>,
    /// Companies in the selected segment, in first-seen order.
    companies: Vec<String>,
    company_cursor: usize,
    filter: FilterSpec,
    group: MetricGroup,
    viz: VizMode,
    aggregation: Aggregation,
    selected_field: usize,
    panel_idx: usize,
    export_path: PathBuf,
    status: String,
    dashboard: Option<Dashboard>,
}

impl<'a> App<'a> {
    fn new(dataset: &'a Dataset, args: &TuiArgs, filter: FilterSpec) -> Self {
        let segments = FilterOptions::from_dataset(dataset, None).segments;
        let segment_idx = filter
            .segment
            .as_ref()
            .and_then(|s| segments.iter().position(|x| x == s))
            .unwrap_or(segments.len());
        let options = FilterOptions::from_dataset(dataset, filter.segment.as_deref());

        let mut app = Self {
            dataset,
            segments,
            segment_idx,
            year_bounds: options.year_bounds,
            companies: options.companies,
            company_cursor: 0,
            filter,
            group: args.group,
            viz: args.viz,
            aggregation: args.aggregation,
            selected_field: 0,
            panel_idx: 0,
            export_path: args.export.clone(),
            status: String::new(),
            dashboard: None,
        };
        app.rebuild();
        app
    }

    fn request(&self) -> DashboardRequest {
        DashboardRequest {
            filter: self.filter.clone(),
            group: self.group,
            viz: self.viz,
            aggregation: self.aggregation,
        }
    }

    /// Recompute the dashboard; errors are shown, not fatal.
    fn rebuild(&mut self) {
        match build_dashboard(self.dataset, &self.request()) {
            Ok(d) => {
                self.status = format!("{} rows | {}", d.rows, d.period_label);
                self.panel_idx = self.panel_idx.min(d.panels.len().saturating_sub(1));
                self.dashboard = Some(d);
            }
            Err(err) => {
                self.status = err.to_string();
                self.dashboard = None;
            }
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::Terminal(format!("terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::Terminal(format!("event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::Terminal(format!("event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.selected_field = self.selected_field.saturating_sub(1),
            KeyCode::Down => self.selected_field = (self.selected_field + 1).min(FIELD_COUNT - 1),
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter | KeyCode::Char(' ') if self.selected_field == FIELD_COMPANY => {
                self.toggle_company();
            }
            KeyCode::Backspace if self.selected_field == FIELD_COMPANY => self.clear_companies(),
            KeyCode::Tab | KeyCode::PageDown => self.step_panel(1),
            KeyCode::BackTab | KeyCode::PageUp => self.step_panel(-1),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn step_panel(&mut self, delta: isize) {
        let Some(d) = &self.dashboard else {
            return;
        };
        let n = d.panels.len() as isize;
        if n == 0 {
            return;
        }
        self.panel_idx = (self.panel_idx as isize + delta).rem_euclid(n) as usize;
    }

    fn adjust_field(&mut self, delta: i32) {
        let forward = delta >= 0;
        match self.selected_field {
            FIELD_SEGMENT => {
                // One extra slot for "all segments".
                let n = self.segments.len() + 1;
                self.segment_idx = if forward {
                    (self.segment_idx + 1) % n
                } else {
                    (self.segment_idx + n - 1) % n
                };
                self.filter.segment = self.segments.get(self.segment_idx).cloned();
                let options = FilterOptions::from_dataset(self.dataset, self.filter.segment.as_deref());
                self.year_bounds = options.year_bounds;
                self.filter.year_range = crate::app::default_year_range(self.year_bounds);
                // Company picks rarely survive a segment change.
                self.companies = options.companies;
                self.company_cursor = 0;
                self.filter.companies.clear();
                self.panel_idx = 0;
            }
            FIELD_COMPANY => {
                // Moving the cursor does not change the selection.
                let n = self.companies.len();
                if n > 0 {
                    self.company_cursor = (self.company_cursor as isize + delta.signum() as isize)
                        .rem_euclid(n as isize) as usize;
                }
                return;
            }
            FIELD_FROM => self.set_years(self.filter.year_range.0.saturating_add(delta.signum()), self.filter.year_range.1),
            FIELD_TO => self.set_years(self.filter.year_range.0, self.filter.year_range.1.saturating_add(delta.signum())),
            FIELD_GROUP => {
                self.group = if forward { self.group.next() } else { self.group.prev() };
                self.panel_idx = 0;
            }
            FIELD_VIZ => self.viz = if forward { self.viz.next() } else { self.viz.prev() },
            FIELD_AGG => {
                self.aggregation = if forward {
                    self.aggregation.next()
                } else {
                    self.aggregation.prev()
                }
            }
            _ => return,
        }
        self.rebuild();
    }

    /// Apply a year edit, keeping both bounds inside the segment's range and
    /// the upper bound no lower than the lower one.
    fn set_years(&mut self, min: i32, max: i32) {
        let Some(bounds) = self.year_bounds else {
            return;
        };
        let mut filter = self.filter.clone();
        filter.year_range = (min, max);
        self.filter = filter.clamped_to(bounds);
    }

    fn toggle_company(&mut self) {
        let Some(name) = self.companies.get(self.company_cursor) else {
            return;
        };
        if !self.filter.companies.remove(name) {
            self.filter.companies.insert(name.clone());
        }
        self.rebuild();
    }

    fn clear_companies(&mut self) {
        if self.filter.companies.is_empty() {
            return;
        }
        self.filter.companies.clear();
        self.rebuild();
    }

    fn export(&mut self) {
        let Some(d) = &self.dashboard else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        self.status = match crate::io::export::write_dashboard_json(&self.export_path, d) {
            Ok(()) => format!("Exported {}", self.export_path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("bvd", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" Bovespa dashboard | {}", self.group)),
        ]));

        let summary = match &self.dashboard {
            Some(d) => format!(
                "período: {} | linhas: {} | empresas: {}",
                d.period_label,
                d.rows,
                d.companies.len()
            ),
            None => "-".to_string(),
        };
        lines.push(Line::from(Span::styled(summary, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::LEFT | Borders::RIGHT | Borders::TOP));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(FIELD_COUNT as u16 + 2), Constraint::Min(0)])
            .split(columns[0]);

        self.draw_settings(frame, left[0]);
        self.draw_panel_list(frame, left[1]);
        self.draw_panel(frame, columns[1]);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let segment = self.filter.segment.as_deref().unwrap_or("(todos)");
        let company = match self.companies.get(self.company_cursor) {
            Some(name) => {
                let mark = if self.filter.companies.contains(name) { "[x]" } else { "[ ]" };
                format!("{mark} {}", truncate(name, 14))
            }
            None => "-".to_string(),
        };
        let picked = match self.filter.companies.len() {
            0 => "todas".to_string(),
            n => n.to_string(),
        };
        let items = vec![
            ListItem::new(format!("Segmento: {}", truncate(segment, 20))),
            ListItem::new(format!("Empresas ({picked}): {company}")),
            ListItem::new(format!("De: {}", self.filter.year_range.0)),
            ListItem::new(format!("Até: {}", self.filter.year_range.1)),
            ListItem::new(format!("Grupo: {}", self.group)),
            ListItem::new(format!("Visualização: {}", self.viz)),
            ListItem::new(format!("Agregação: {}", self.aggregation)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_panel_list(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .dashboard
            .iter()
            .flat_map(|d| &d.panels)
            .map(|p| {
                let style = if p.body == PanelBody::NoData {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(truncate(&p.title, 28)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Charts").borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(self.dashboard.as_ref().map(|_| self.panel_idx));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let panel = self.dashboard.as_ref().and_then(|d| d.panels.get(self.panel_idx));
        let title = panel
            .map(|p| format!("{} [{}]", p.title, panel_tag(p)))
            .unwrap_or_else(|| "Dashboard".to_string());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(panel) = panel else {
            let msg = Paragraph::new(self.status.as_str())
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center);
            frame.render_widget(msg, inner);
            return;
        };

        match &panel.body {
            PanelBody::Bar(bars) => {
                let text = crate::plot::render_bars(bars, (inner.width as usize).saturating_sub(40));
                frame.render_widget(Paragraph::new(text), inner);
            }
            PanelBody::Heatmap(m) => {
                frame.render_widget(Paragraph::new(crate::plot::render_heatmap(m)), inner);
            }
            PanelBody::Line(series) => draw_line_panel(frame, inner, panel, series),
            PanelBody::GroupedBar(g) => {
                let header: Vec<String> = std::iter::once("empresa".to_string())
                    .chain(g.series.iter().map(|s| s.header().to_string()))
                    .collect();
                let rows = g.groups.iter().map(|e| {
                    Row::new(
                        std::iter::once(Cell::from(e.company.clone()))
                            .chain(e.values.iter().map(|v| Cell::from(fmt_value(*v)))),
                    )
                });
                render_table(frame, inner, header, rows.collect());
            }
            PanelBody::Pie(pies) => {
                let header = vec!["empresa".to_string(), "parte".to_string(), "valor".to_string(), "%".to_string()];
                let mut rows = Vec::new();
                for pie in pies {
                    let total: f64 = pie.slices.iter().filter_map(|s| s.value).sum();
                    for s in &pie.slices {
                        let share = match s.value {
                            Some(v) if total != 0.0 => format!("{:.1}%", 100.0 * v / total),
                            _ => String::new(),
                        };
                        rows.push(Row::new(vec![
                            Cell::from(pie.label.clone()),
                            Cell::from(s.part.header()),
                            Cell::from(fmt_value(s.value)),
                            Cell::from(share),
                        ]));
                    }
                }
                render_table(frame, inner, header, rows);
            }
            PanelBody::Table(t) => {
                let header: Vec<String> = ["empresa".to_string(), "ano".to_string()]
                    .into_iter()
                    .chain(t.columns.iter().map(|c| c.header().to_string()))
                    .collect();
                let rows = t
                    .rows
                    .iter()
                    .map(|r| {
                        Row::new(
                            [Cell::from(r.company.clone()), Cell::from(r.period.to_string())]
                                .into_iter()
                                .chain(r.values.iter().map(|v| Cell::from(fmt_value(*v)))),
                        )
                    })
                    .collect();
                render_table(frame, inner, header, rows);
            }
            PanelBody::NoData => {
                let msg = Paragraph::new("no data")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center);
                frame.render_widget(msg, inner);
            }
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Space pick  ⌫ clear  Tab chart  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, header: Vec<String>, rows: Vec<Row<'static>>) {
    let first = Constraint::Length(24);
    let widths: Vec<Constraint> = std::iter::once(first)
        .chain(std::iter::repeat_n(Constraint::Min(10), header.len().saturating_sub(1)))
        .collect();
    let header = Row::new(header).style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(rows, widths).header(header).column_spacing(1);
    frame.render_widget(table, area);
}

fn draw_line_panel(frame: &mut ratatui::Frame<'_>, area: Rect, panel: &Panel, series: &[LineSeries]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let (points, x_bounds, y_bounds) = chart_series(series);
    let y_label = panel.roles.values.first().map(String::as_str).unwrap_or("");
    let widget = PanelLineChart {
        series: &points,
        x_bounds,
        y_bounds,
        x_label: "ano",
        y_label,
        fmt_x: fmt_axis_year,
        fmt_y: fmt_axis_value,
    };
    frame.render_widget(widget, chunks[0]);

    let legend: Vec<Span> = series
        .iter()
        .enumerate()
        .flat_map(|(i, s)| {
            [
                Span::styled("■ ", Style::default().fg(legend_color(i))),
                Span::raw(format!("{}  ", crate::viz::short_company_label(&s.company))),
            ]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(legend)), chunks[1]);
}

/// Build plot series (present points only) and padded bounds.
fn chart_series(series: &[LineSeries]) -> (Vec<Vec<(f64, f64)>>, [f64; 2], [f64; 2]) {
    let points: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .filter_map(|&(p, v)| v.map(|v| (p as f64, v)))
                .collect()
        })
        .collect();

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points.iter().flatten() {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !x_min.is_finite() || !x_max.is_finite() {
        return (points, [0.0, 1.0], [0.0, 1.0]);
    }
    let x_bounds = [x_min - 0.25, x_max + 0.25];

    let pad = ((y_max - y_min).abs() * 0.05).max(y_max.abs().max(1.0) * 0.05);
    let y_bounds = [y_min - pad, y_max + pad];

    (points, x_bounds, y_bounds)
}

fn fmt_axis_year(v: f64) -> String {
    format!("{}", v.round() as i64)
}

fn fmt_axis_value(v: f64) -> String {
    fmt_value(Some(v))
}
