//! Ratatui-based terminal UI.
//!
//! The TUI mirrors the interactive chart UI: a line chart of conversion
//! rates per variation, a day/week bucketing toggle, per-variation selection
//! toggles, and a point inspector showing the ranked rates for the hovered
//! bucket.

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
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::{RunConfig, RunOutput};
use crate::cli::ChartArgs;
use crate::domain::{ChartPoint, TimeMode, VariationCatalog};
use crate::error::AppError;
use crate::io::ingest::IngestedSnapshot;
use crate::report::{PercentFormatter, date_label, rank_point};

mod plotters_chart;

use plotters_chart::{CvrPlottersChart, SeriesLine};

/// Default output path for the `e` (export series) key.
const EXPORT_PATH: &str = "cvr-series.json";

/// Start the TUI.
pub fn run(args: ChartArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args)?;
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
    input: Option<PathBuf>,
    args: ChartArgs,
    seed: u64,
    snapshot: IngestedSnapshot,
    catalog: VariationCatalog,
    mode: TimeMode,
    selected: Vec<String>,
    hovered: usize,
    formatter: PercentFormatter,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(args: ChartArgs) -> Result<Self, AppError> {
        let snapshot = crate::app::load_or_generate(&args)?;
        let catalog = VariationCatalog::from_raw(&snapshot.data.variations);

        let selected = if args.variations.is_empty() {
            catalog.ids()
        } else {
            args.variations.clone()
        };

        let status = if snapshot.row_errors.is_empty() {
            format!("Loaded {} rows.", snapshot.stats.n_rows)
        } else {
            format!(
                "Loaded {} rows ({} skipped for bad dates).",
                snapshot.stats.n_rows,
                snapshot.row_errors.len()
            )
        };

        let mut app = Self {
            input: args.input.clone(),
            seed: args.seed,
            mode: args.mode,
            args,
            snapshot,
            catalog,
            selected,
            hovered: 0,
            formatter: PercentFormatter::comma(),
            status,
            run: None,
        };
        app.recompute()?;
        app.hovered = app.last_index();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
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

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('m') => {
                self.mode = match self.mode {
                    TimeMode::Day => TimeMode::Week,
                    TimeMode::Week => TimeMode::Day,
                };
                self.recompute()?;
                self.hovered = self.hovered.min(self.last_index());
                self.status = format!("mode: {}", self.mode.display_name());
            }
            KeyCode::Left => {
                self.hovered = self.hovered.saturating_sub(1);
            }
            KeyCode::Right => {
                self.hovered = (self.hovered + 1).min(self.last_index());
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as usize) - ('1' as usize);
                self.toggle_variation(index)?;
            }
            KeyCode::Char('r') => {
                self.reload()?;
            }
            KeyCode::Char('e') => {
                self.export_series()?;
            }
            _ => {}
        }

        Ok(false)
    }

    fn toggle_variation(&mut self, index: usize) -> Result<(), AppError> {
        let Some(variation) = self.catalog.variations().get(index) else {
            return Ok(());
        };
        let id = variation.id().to_string();

        if let Some(pos) = self.selected.iter().position(|x| x == &id) {
            // Mirror the interactive UI: the last selected variation cannot
            // be toggled off.
            if self.selected.len() == 1 {
                self.status = "At least one variation must stay selected.".to_string();
                return Ok(());
            }
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }

        self.recompute()?;
        self.status = format!("selected: {}", self.selected.join(","));
        Ok(())
    }

    fn reload(&mut self) -> Result<(), AppError> {
        match &self.input {
            Some(path) => {
                self.snapshot = crate::io::ingest::load_snapshot(path)?;
                self.status = format!("Reloaded {}.", path.display());
            }
            None => {
                self.seed = self.seed.wrapping_add(1);
                let mut args = self.args.clone();
                args.seed = self.seed;
                self.snapshot = crate::app::load_or_generate(&args)?;
                self.status = format!("Resampled (seed {}).", self.seed);
            }
        }

        self.catalog = VariationCatalog::from_raw(&self.snapshot.data.variations);
        self.selected
            .retain(|id| self.catalog.get(id).is_some());
        if self.selected.is_empty() {
            self.selected = self.catalog.ids();
        }
        self.recompute()?;
        self.hovered = self.hovered.min(self.last_index());
        Ok(())
    }

    fn export_series(&mut self) -> Result<(), AppError> {
        let Some(run) = &self.run else {
            self.status = "Nothing to export.".to_string();
            return Ok(());
        };

        let series = crate::io::series::build_series_file(
            &run.points,
            &self.catalog,
            &run.selected,
            run.range,
            self.mode,
        );
        match crate::io::series::write_series_json(std::path::Path::new(EXPORT_PATH), &series) {
            Ok(()) => self.status = format!("Exported series to {EXPORT_PATH}."),
            Err(err) => self.status = format!("Export failed: {err}"),
        }
        Ok(())
    }

    fn recompute(&mut self) -> Result<(), AppError> {
        let config = RunConfig {
            mode: self.mode,
            selected: Some(self.selected.clone()),
        };
        let run = crate::app::pipeline::run_chart(&self.snapshot.data, &self.catalog, &config)?;
        self.run = Some(run);
        Ok(())
    }

    fn last_index(&self) -> usize {
        self.run
            .as_ref()
            .map(|r| r.points.len().saturating_sub(1))
            .unwrap_or(0)
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("cvr", Style::default().fg(Color::Cyan)),
            Span::raw(" — conversion rate by variation"),
        ]));

        let source = self
            .input
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("sample (seed {})", self.seed));

        let range = self
            .run
            .as_ref()
            .map(|r| format!("[{:.0}, {:.0}]%", r.range.lower, r.range.upper))
            .unwrap_or_else(|| "-".to_string());

        lines.push(Line::from(Span::styled(
            format!(
                "source: {source} | rows: {} | mode: {} | y: {range} | selected: {}/{}",
                self.snapshot.stats.n_rows,
                self.mode.display_name(),
                self.selected.len(),
                self.catalog.len(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(34)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_inspector(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Conversion rate").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        if run.points.is_empty() {
            let msg = Paragraph::new("No buckets to draw.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        }

        let (series, hovered, x_bounds, y_bounds) = self.chart_series(run);

        let (chart_rect, insets) = chart_layout(inner);
        let widget = CvrPlottersChart {
            series: &series,
            hovered: &hovered,
            x_bounds,
            y_bounds,
            x_label: "bucket",
            y_label: "rate (%)",
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, &run.points, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    /// Build the Plotters series: one line per selected variation, nulls
    /// skipped so defined neighbors connect, plus hovered-bucket markers.
    fn chart_series(
        &self,
        run: &RunOutput,
    ) -> (Vec<SeriesLine>, Vec<(f64, f64)>, [f64; 2], [f64; 2]) {
        let n = run.points.len();
        let x_max = if n > 1 { (n - 1) as f64 } else { 1.0 };
        let x_bounds = [0.0, x_max];
        let y_bounds = run.range.as_bounds();

        let mut series = Vec::new();
        for v in self.catalog.variations() {
            if !run.selected.iter().any(|id| id == v.id()) {
                continue;
            }
            let points: Vec<(f64, f64)> = run
                .points
                .iter()
                .enumerate()
                .filter_map(|(i, p)| {
                    p.value(v.id())
                        .filter(|y| y.is_finite())
                        .map(|y| (i as f64, y))
                })
                .collect();
            series.push(SeriesLine {
                color: v.color().rgb,
                points,
            });
        }

        let hovered: Vec<(f64, f64)> = run
            .points
            .get(self.hovered)
            .map(|point| {
                run.selected
                    .iter()
                    .filter_map(|id| point.value(id).map(|y| (self.hovered as f64, y)))
                    .collect()
            })
            .unwrap_or_default();

        (series, hovered, x_bounds, y_bounds)
    }

    fn draw_inspector(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Inspector").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line> = Vec::new();

        if let Some(run) = &self.run {
            if let Some(point) = run.points.get(self.hovered) {
                lines.push(Line::from(Span::styled(
                    date_label(&point.date),
                    Style::default().add_modifier(Modifier::BOLD),
                )));

                let ranked = rank_point(point, &self.catalog);
                if ranked.is_empty() {
                    lines.push(Line::from(Span::styled(
                        format!("  (no data: {})", crate::report::MISSING_VALUE),
                        Style::default().fg(Color::Gray),
                    )));
                }
                for r in &ranked {
                    let (red, green, blue) = r.variation.color().rgb;
                    lines.push(Line::from(vec![
                        Span::styled("● ", Style::default().fg(Color::Rgb(red, green, blue))),
                        Span::raw(format!("{:<14}", r.variation.name())),
                        Span::styled(
                            format!("{:>8}", self.formatter.format(r.value)),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ]));
                }
            }
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Variations",
            Style::default().fg(Color::Gray),
        )));
        for (i, v) in self.catalog.variations().iter().enumerate() {
            let selected = self.selected.iter().any(|id| id == v.id());
            let mark = if selected { "■" } else { "□" };
            let (red, green, blue) = v.color().rgb;
            let name_style = if selected {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("[{}] ", i + 1),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("{mark} "),
                    Style::default().fg(Color::Rgb(red, green, blue)),
                ),
                Span::styled(v.name().to_string(), name_style),
            ]));
        }

        let p = Paragraph::new(Text::from(lines));
        frame.render_widget(p, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ inspect  m day/week  1-9 toggle  r reload  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    points: &[ChartPoint],
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        // Tick labels are the bucket labels, not raw indices.
        let index = (x_val.round() as usize).min(points.len().saturating_sub(1));
        let Some(point) = points.get(index) else {
            continue;
        };
        let label = point.label.clone();
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label_len = label.chars().count() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.0}%");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("bucket")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("rate (%)")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.0}")
}
