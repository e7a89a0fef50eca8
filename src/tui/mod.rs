//! Ratatui-based indicator dashboard.
//!
//! One persisted indicator table is shown verbatim next to a multi-select list
//! of its indicator columns. Every selection change reshapes the table and
//! rebuilds the chart; an empty selection shows a prompt instead of a chart.

use std::io;
use std::path::{Path, PathBuf};
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

use crate::domain::WideTable;
use crate::error::AppError;

mod plotters_chart;
pub mod reshape;

use plotters_chart::{IndicatorChart, series_color};
use reshape::{ChartSpec, LongRow, build_chart, reshape_long};

/// Shown in the chart area while nothing is selected.
pub const EMPTY_SELECTION_PROMPT: &str = "Select one or more indicators to plot";

const PAGE_ROWS: usize = 10;
const TABLE_HEIGHT: u16 = 12;
const TABLE_COL_WIDTH: u16 = 14;

/// Open `path` in the dashboard.
pub fn run(path: &Path) -> Result<(), AppError> {
    // Load before touching the terminal so errors print normally.
    let table = crate::io::read_indicator_csv(path)?;
    let mut app = App::new(path.to_path_buf(), table);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Indicators,
    Table,
}

struct App {
    path: PathBuf,
    table: WideTable,
    cursor: usize,
    checked: Vec<bool>,
    focus: Focus,
    row_offset: usize,
    col_offset: usize,
    long: Vec<LongRow>,
    chart: Option<ChartSpec>,
    status: String,
}

impl App {
    fn new(path: PathBuf, table: WideTable) -> Self {
        let checked = vec![false; table.columns.len()];
        let status = format!("{} rows × {} indicators", table.rows.len(), table.columns.len());
        Self {
            path,
            table,
            cursor: 0,
            checked,
            focus: Focus::Indicators,
            row_offset: 0,
            col_offset: 0,
            long: Vec::new(),
            chart: None,
            status,
        }
    }

    /// Selected indicator names in column order.
    fn selected(&self) -> Vec<String> {
        self.table
            .columns
            .iter()
            .zip(&self.checked)
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn recompute(&mut self) {
        let selected = self.selected();
        self.long = reshape_long(&self.table, &selected);
        self.chart = build_chart(&self.long, &selected);
        self.status = match &self.chart {
            Some(_) => format!("{} indicator(s), {} points", selected.len(), self.long.len()),
            None => EMPTY_SELECTION_PROMPT.to_string(),
        };
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
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
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

    /// Returns `true` when the dashboard should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Indicators => Focus::Table,
                    Focus::Table => Focus::Indicators,
                };
            }
            KeyCode::Up => match self.focus {
                Focus::Indicators => self.cursor = self.cursor.saturating_sub(1),
                Focus::Table => self.row_offset = self.row_offset.saturating_sub(1),
            },
            KeyCode::Down => match self.focus {
                Focus::Indicators => {
                    if self.cursor + 1 < self.table.columns.len() {
                        self.cursor += 1;
                    }
                }
                Focus::Table => self.scroll_rows(1),
            },
            KeyCode::Left if self.focus == Focus::Table => {
                self.col_offset = self.col_offset.saturating_sub(1);
            }
            KeyCode::Right if self.focus == Focus::Table => {
                if self.col_offset + 1 < self.table.columns.len() {
                    self.col_offset += 1;
                }
            }
            KeyCode::PageUp => self.row_offset = self.row_offset.saturating_sub(PAGE_ROWS),
            KeyCode::PageDown => self.scroll_rows(PAGE_ROWS),
            KeyCode::Char(' ') => {
                if let Some(on) = self.checked.get_mut(self.cursor) {
                    *on = !*on;
                    self.recompute();
                }
            }
            KeyCode::Char('a') => {
                self.checked.iter_mut().for_each(|on| *on = true);
                self.recompute();
            }
            KeyCode::Char('c') => {
                self.checked.iter_mut().for_each(|on| *on = false);
                self.recompute();
            }
            _ => {}
        }
        false
    }

    fn scroll_rows(&mut self, by: usize) {
        let max = self.table.rows.len().saturating_sub(1);
        self.row_offset = (self.row_offset + by).min(max);
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let first = self.table.rows.first().map(|r| r.date.to_string());
        let last = self.table.rows.last().map(|r| r.date.to_string());
        let span = match (first, last) {
            (Some(a), Some(b)) => format!("{a} → {b}"),
            _ => "no rows".to_string(),
        };
        let line = Line::from(vec![
            Span::styled("cvm", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {} ", self.path.display())),
            Span::styled(format!("| {span}"), Style::default().fg(Color::Gray)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(0)])
            .split(area);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(TABLE_HEIGHT)])
            .split(cols[1]);

        self.draw_indicators(frame, cols[0]);
        self.draw_chart(frame, right[0]);
        self.draw_table(frame, right[1]);
    }

    fn draw_indicators(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let selected = self.selected();
        let items: Vec<ListItem> = self
            .table
            .columns
            .iter()
            .zip(&self.checked)
            .map(|(name, on)| {
                let mark = if *on { "[x] " } else { "[ ] " };
                let style = match selected.iter().position(|s| s == name) {
                    Some(idx) => Style::default().fg(series_color(idx)),
                    None => Style::default(),
                };
                ListItem::new(Line::from(vec![Span::raw(mark), Span::styled(name.clone(), style)]))
            })
            .collect();

        let list = List::new(items)
            .block(focus_block("Indicators", self.focus == Focus::Indicators))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Chart").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(spec) = &self.chart else {
            let msg = Paragraph::new(EMPTY_SELECTION_PROMPT)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow));
            let rect = Rect {
                y: inner.y + inner.height / 2,
                height: 1u16.min(inner.height),
                ..inner
            };
            frame.render_widget(msg, rect);
            return;
        };

        frame.render_widget(IndicatorChart { spec, x_label: "year" }, inner);
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let visible_cols: Vec<usize> = (self.col_offset..self.table.columns.len()).collect();

        let mut header = vec![Cell::from(self.table.date_column.clone())];
        header.extend(visible_cols.iter().map(|&c| Cell::from(self.table.columns[c].clone())));

        let rows: Vec<Row> = self
            .table
            .rows
            .iter()
            .skip(self.row_offset)
            .map(|row| {
                let mut cells = vec![Cell::from(row.date.to_string())];
                cells.extend(
                    visible_cols
                        .iter()
                        .map(|&c| Cell::from(format_cell(row.values.get(c).copied().flatten()))),
                );
                Row::new(cells)
            })
            .collect();

        let widths = std::iter::repeat_n(Constraint::Length(TABLE_COL_WIDTH), visible_cols.len() + 1);
        let title = format!(
            "Data (rows {}-{} of {})",
            (self.row_offset + 1).min(self.table.rows.len()),
            self.table.rows.len(),
            self.table.rows.len()
        );
        let table = Table::new(rows, widths)
            .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(focus_block(&title, self.focus == Focus::Table));
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ move  Space toggle  a all  c clear  Tab focus  PgUp/PgDn scroll  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(Text::from(line)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn focus_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(style)
}

// Same text the exporter wrote.
fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WideRow;
    use chrono::NaiveDate;

    fn app() -> App {
        let rows = (2019..=2021)
            .map(|year| WideRow {
                date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
                values: vec![Some(20.5), Some(1.5), None],
            })
            .collect();
        let table = WideTable {
            date_column: "Date".to_string(),
            columns: vec!["Close".to_string(), "Net_Margin".to_string(), "ROE".to_string()],
            rows,
        };
        App::new(PathBuf::from("9512_95123.SA.csv"), table)
    }

    #[test]
    fn starts_with_prompt_and_no_chart() {
        let mut app = app();
        app.recompute();
        assert!(app.chart.is_none());
        assert_eq!(app.status, EMPTY_SELECTION_PROMPT);
    }

    #[test]
    fn toggling_rebuilds_chart() {
        let mut app = app();
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Char(' '));
        assert_eq!(app.selected(), vec!["Net_Margin".to_string()]);
        assert_eq!(app.long.len(), 3);
        assert_eq!(app.chart.as_ref().map(|c| c.series.len()), Some(1));

        app.handle_key(KeyCode::Char(' '));
        assert!(app.chart.is_none());
    }

    #[test]
    fn select_all_then_clear() {
        let mut app = app();
        app.handle_key(KeyCode::Char('a'));
        let chart = app.chart.as_ref().unwrap();
        assert_eq!(chart.series.len(), 3);
        // ROE has no values; its series is empty but still listed.
        assert!(chart.series[2].points.is_empty());

        app.handle_key(KeyCode::Char('c'));
        assert!(app.chart.is_none());
        assert!(app.long.is_empty());
    }

    #[test]
    fn cursor_and_scroll_stay_in_range() {
        let mut app = app();
        for _ in 0..10 {
            app.handle_key(KeyCode::Down);
        }
        assert_eq!(app.cursor, 2);

        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::PageDown);
        assert_eq!(app.row_offset, 2);
        app.handle_key(KeyCode::PageUp);
        assert_eq!(app.row_offset, 0);
        assert!(app.handle_key(KeyCode::Char('q')));
    }
}
