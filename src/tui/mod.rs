//! Ratatui-based terminal dashboard.
//!
//! The TUI loads the datasets once, then lets the user page through chart tabs
//! and adjust the threshold / date window. Every adjustment re-runs the same
//! aggregation pipeline used by `ote report`, so the two front-ends can never
//! disagree about the numbers.

use std::io;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Terminal,
};

use crate::app::pipeline::{self, RunOutput};
use crate::data::{load_market_data, DataSource, LoadReport};
use crate::domain::{MarketData, RunConfig};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::MarketPlottersChart;

const TAB_TITLES: [&str; 7] = [
    "Prices",
    "Hourly",
    "Cheap hours",
    "Spark",
    "Regulation",
    "Imbalance",
    "Indexes",
];

/// Days the date window moves per `[` / `]` press.
const WINDOW_STEP_DAYS: i64 = 7;
/// Threshold change per `+` / `-` press, in price units.
const THRESHOLD_STEP: f64 = 5.0;

/// Start the TUI.
pub fn run(source: &DataSource, config: RunConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(source, config)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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

struct App {
    /// Unfiltered datasets, loaded once at startup.
    raw: MarketData,
    config: RunConfig,
    run: RunOutput,
    tab: usize,
    status: String,
}

impl App {
    fn new(source: &DataSource, mut config: RunConfig) -> Result<Self, AppError> {
        let (raw, load_report) = load_market_data(source, config.currency)?;

        // Pin the window to concrete dates so `[` / `]` have something to shift.
        if let Some((first, last)) = raw.date_span() {
            config.from.get_or_insert(first);
            config.to.get_or_insert(last);
        }

        let run = pipeline::run_with_data(&raw, &config)?;
        Ok(Self {
            raw,
            config,
            run,
            tab: 0,
            status: load_status(&load_report),
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
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

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Right => {
                self.tab = (self.tab + 1) % TAB_TITLES.len();
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.tab = (self.tab + TAB_TITLES.len() - 1) % TAB_TITLES.len();
            }
            KeyCode::Char(c @ '1'..='7') => {
                self.tab = (c as usize) - ('1' as usize);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.adjust_threshold(THRESHOLD_STEP);
            }
            KeyCode::Char('-') => {
                self.adjust_threshold(-THRESHOLD_STEP);
            }
            KeyCode::Char('[') => {
                self.shift_window(-WINDOW_STEP_DAYS);
            }
            KeyCode::Char(']') => {
                self.shift_window(WINDOW_STEP_DAYS);
            }
            KeyCode::Char('r') => {
                if let Some((first, last)) = self.raw.date_span() {
                    self.config.from = Some(first);
                    self.config.to = Some(last);
                    self.recompute("Window reset to full span.");
                }
            }
            _ => {}
        }
        false
    }

    fn adjust_threshold(&mut self, delta: f64) {
        self.config.threshold += delta;
        let msg = format!(
            "Threshold: {:.2} {}/MWh",
            self.config.threshold,
            self.config.currency.label()
        );
        self.recompute(&msg);
    }

    fn shift_window(&mut self, days: i64) {
        let (Some(from), Some(to)) = (self.config.from, self.config.to) else {
            return;
        };
        let prev = (from, to);
        self.config.from = Some(from + ChronoDuration::days(days));
        self.config.to = Some(to + ChronoDuration::days(days));

        match pipeline::run_with_data(&self.raw, &self.config) {
            Ok(run) => {
                self.run = run;
                self.status = format!(
                    "Window: {} .. {}",
                    self.config.from.unwrap_or(prev.0),
                    self.config.to.unwrap_or(prev.1)
                );
            }
            Err(err) => {
                // Keep the last good window instead of showing an empty screen.
                self.config.from = Some(prev.0);
                self.config.to = Some(prev.1);
                self.status = err.to_string();
            }
        }
    }

    fn recompute(&mut self, on_success: &str) {
        match pipeline::run_with_data(&self.raw, &self.config) {
            Ok(run) => {
                self.run = run;
                self.status = on_success.to_string();
            }
            Err(err) => {
                self.status = err.to_string();
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        self.draw_chart(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let unit = self.config.currency.label();
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("ote", Style::default().fg(Color::Cyan)),
            Span::raw(" — Czech electricity-market dashboard"),
        ]));

        let window = match (self.config.from, self.config.to) {
            (Some(from), Some(to)) => format!("{from} .. {to}"),
            _ => "full".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "currency: {unit} | window: {window} | threshold: {:.2} {unit}/MWh",
                self.config.threshold
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(s) = &self.run.derived.summary {
            lines.push(Line::from(Span::styled(
                format!(
                    "mean {:.2} | median {:.2} | {} of {} hours below ({:.1}%) | {} negative",
                    s.mean, s.median, s.hours_below, s.hours, s.pct_below, s.negative_hours
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(TAB_TITLES.to_vec())
            .select(self.tab)
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chart = tab_chart(self.tab, &self.run, &self.config);

        let block = Block::default().title(chart.title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if chart.primary.is_empty() {
            let msg = Paragraph::new("No data for this view in the current window.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let (x_bounds, y_bounds) = series_bounds(&chart.primary, &chart.secondary, chart.baseline);
        let widget = MarketPlottersChart {
            primary: &chart.primary,
            secondary: &chart.secondary,
            baseline: chart.baseline,
            x_bounds,
            y_bounds,
            x_label: chart.x_label,
            y_label: chart.y_label,
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab/←/→ or 1-7 switch  +/- threshold  [/] shift window  r reset  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Series and labels for one chart tab.
struct TabChart {
    title: &'static str,
    primary: Vec<(f64, f64)>,
    secondary: Vec<(f64, f64)>,
    baseline: Option<f64>,
    x_label: &'static str,
    y_label: String,
}

/// Map a tab index onto chart series from the derived run output.
///
/// X coordinates are plain indexes (day, hour, or month position); the charts
/// are for shape reading, the exact values live in the report tables.
fn tab_chart(tab: usize, run: &RunOutput, config: &RunConfig) -> TabChart {
    let d = &run.derived;
    let unit = config.currency.label();

    match tab {
        0 => TabChart {
            title: "Daily day-ahead average + moving average",
            primary: indexed(d.daily.iter().map(|r| r.avg)),
            secondary: indexed(d.daily_ma.iter().copied()),
            baseline: Some(config.threshold),
            x_label: "day",
            y_label: format!("{unit}/MWh"),
        },
        1 => TabChart {
            title: "Average price by hour of day",
            primary: d.hourly.iter().map(|r| (f64::from(r.hour), r.avg)).collect(),
            secondary: Vec::new(),
            baseline: Some(config.threshold),
            x_label: "hour",
            y_label: format!("{unit}/MWh"),
        },
        2 => TabChart {
            title: "Cumulative hours below threshold",
            primary: indexed(d.cumulative_cheap.iter().map(|r| r.cumulative)),
            secondary: Vec::new(),
            baseline: None,
            x_label: "day",
            y_label: "hours".to_string(),
        },
        3 => TabChart {
            title: "Daily spark spread (gas heat vs smart charging)",
            primary: indexed(d.spark_daily.iter().map(|r| r.spark_spread)),
            secondary: Vec::new(),
            baseline: Some(0.0),
            x_label: "day",
            y_label: format!("{unit}/MWh"),
        },
        4 => TabChart {
            title: "Negative regulation volume by hour of day",
            primary: d
                .regulation_hourly
                .iter()
                .map(|r| (f64::from(r.hour), r.volume))
                .collect(),
            secondary: Vec::new(),
            baseline: None,
            x_label: "hour",
            y_label: "MWh".to_string(),
        },
        5 => TabChart {
            title: "Daily system imbalance (clipped average + spread)",
            primary: indexed(d.imbalance_daily.iter().map(|r| r.avg)),
            secondary: indexed(d.imbalance_daily.iter().map(|r| r.spread)),
            baseline: Some(0.0),
            x_label: "day",
            y_label: format!("{unit}/MWh"),
        },
        _ => TabChart {
            title: "Monthly peak vs off-peak index",
            primary: indexed(d.peak_offpeak.iter().map(|r| r.peak_avg)),
            secondary: indexed(d.peak_offpeak.iter().map(|r| r.offpeak_avg)),
            baseline: None,
            x_label: "month",
            y_label: format!("{unit}/MWh"),
        },
    }
}

fn load_status(report: &LoadReport) -> String {
    if report.datasets.is_empty() {
        return "Loaded synthetic sample data.".to_string();
    }
    let dropped: usize = report.datasets.iter().map(|d| d.rows_dropped).sum();
    format!(
        "Loaded {} datasets ({dropped} rows dropped).",
        report.datasets.len()
    )
}

fn indexed(values: impl Iterator<Item = f64>) -> Vec<(f64, f64)> {
    values.enumerate().map(|(i, v)| (i as f64, v)).collect()
}

/// Padded bounds over every visible series.
fn series_bounds(
    primary: &[(f64, f64)],
    secondary: &[(f64, f64)],
    baseline: Option<f64>,
) -> ([f64; 2], [f64; 2]) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for &(x, y) in primary.iter().chain(secondary.iter()) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if let Some(b) = baseline {
        y_min = y_min.min(b);
        y_max = y_max.max(b);
    }

    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        x_min = 0.0;
        x_max = 1.0;
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-9);
    ([x_min, x_max], [y_min - pad, y_max + pad])
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.1}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, SparkPolicy};

    fn app_for_tests() -> App {
        let config = RunConfig {
            currency: Currency::Eur,
            from: None,
            to: None,
            threshold: 50.0,
            ma_window: 7,
            policy: SparkPolicy::for_currency(Currency::Eur),
        };
        App::new(&DataSource::Sample { seed: 42 }, config).unwrap()
    }

    #[test]
    fn every_tab_produces_a_chart() {
        let app = app_for_tests();
        for tab in 0..TAB_TITLES.len() {
            let chart = tab_chart(tab, &app.run, &app.config);
            assert!(!chart.primary.is_empty(), "tab {tab} ({}) is empty", chart.title);
        }
    }

    #[test]
    fn window_shift_past_data_keeps_previous_window() {
        let mut app = app_for_tests();
        // Sample data covers one year; repeatedly shifting back eventually
        // leaves the data behind, and each failed shift must roll back.
        for _ in 0..80 {
            app.shift_window(-WINDOW_STEP_DAYS);
        }
        assert!(app.config.from.is_some());
        assert!(app.config.to.is_some());
        let run = pipeline::run_with_data(&app.raw, &app.config);
        assert!(run.is_ok());
    }

    #[test]
    fn threshold_adjustment_recomputes_summary() {
        let mut app = app_for_tests();
        let before = app.run.derived.summary.clone().unwrap();
        app.adjust_threshold(1000.0);
        let after = app.run.derived.summary.clone().unwrap();
        assert!(after.hours_below >= before.hours_below);
        assert_eq!(after.hours_below, after.hours);
    }

    #[test]
    fn bounds_cover_baseline() {
        let (_, y) = series_bounds(&[(0.0, 10.0), (1.0, 20.0)], &[], Some(0.0));
        assert!(y[0] < 0.0);
        assert!(y[1] > 20.0);
    }
}
