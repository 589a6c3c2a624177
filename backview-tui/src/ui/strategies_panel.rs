//! Strategies view — one tab per strategy, a summary table for the selected tab.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table, Tabs};

use backview_core::domain::Summary;
use backview_core::summaries::LoadState;

use crate::app::{scroll_window, AppState};
use crate::theme;
use crate::ui::truncate;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    if app.store.groups().is_empty() {
        render_placeholder(f, area, app.store.state());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // strategy tabs
            Constraint::Length(1), // filter line
            Constraint::Min(3),    // summary table
        ])
        .split(area);

    render_tabs(f, chunks[0], app);
    render_filter(f, chunks[1], app);
    render_table(f, chunks[2], app);
}

fn render_placeholder(f: &mut Frame, area: Rect, state: &LoadState) {
    let line = match state {
        LoadState::Idle | LoadState::Loading => {
            Line::from(Span::styled("Loading backtest summaries...", theme::warning()))
        }
        LoadState::Failed(msg) => Line::from(vec![
            Span::styled(format!("Failed to load summaries: {msg}"), theme::negative()),
            Span::styled("  [r] retry", theme::muted()),
        ]),
        LoadState::Ready => Line::from(Span::styled("No backtests stored yet.", theme::muted())),
    };
    f.render_widget(Paragraph::new(vec![Line::from(""), line]), area);
}

fn render_tabs(f: &mut Frame, area: Rect, app: &AppState) {
    let titles: Vec<Line> = app
        .store
        .groups()
        .iter()
        .map(|g| Line::from(format!(" {} ({}) ", g.name, g.summaries.len())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.strategies.tab)
        .style(theme::muted())
        .highlight_style(theme::accent_bold())
        .divider(Span::styled("|", theme::muted()));
    f.render_widget(tabs, area);
}

fn render_filter(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = vec![Span::styled(" [h/l] strategy  [j/k] row  [Enter] open  [/] filter", theme::muted())];
    if !app.strategies.filter.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("filter: {}", app.strategies.filter),
            theme::warning(),
        ));
    }
    if app.is_loading() {
        spans.push(Span::styled("  refreshing...", theme::warning()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(f: &mut Frame, area: Rect, app: &AppState) {
    let rows_data = app.visible_summaries();
    if rows_data.is_empty() {
        let text = Paragraph::new(Span::styled("No backtests match the filter.", theme::muted()));
        f.render_widget(text, area);
        return;
    }

    // Header takes one line.
    let visible = (area.height as usize).saturating_sub(1).max(1);
    let cursor = app.strategies.cursor;
    // Normally the stored offset; only differs for a frame after a resize.
    let offset = scroll_window(app.strategies.scroll_offset, cursor, visible);

    let header = Row::new(
        ["", "ID", "Period", "Capital", "Symbols", "Parameters", "Created"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::accent_bold())),
    );

    let rows: Vec<Row> = rows_data
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, s)| {
            let open = app.dashboard.tabs().contains(s.id);
            let row = summary_row(s, open);
            if i == cursor {
                row.style(theme::cursor())
            } else {
                row
            }
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(6),
        Constraint::Length(25),
        Constraint::Length(12),
        Constraint::Length(20),
        Constraint::Min(20),
        Constraint::Length(16),
    ];
    f.render_widget(Table::new(rows, widths).header(header), area);
}

fn summary_row(s: &Summary, open: bool) -> Row<'static> {
    let capital = s
        .capital
        .map(|c| format!("{c:.0}"))
        .unwrap_or_else(|| "-".into());
    let created = s
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into());
    let marker = if open {
        Span::styled("●", theme::positive())
    } else {
        Span::raw(" ")
    };
    Row::new(vec![
        Cell::from(marker),
        Cell::from(s.id.to_string()),
        Cell::from(s.period()),
        Cell::from(capital),
        Cell::from(truncate(&s.symbols.join(","), 20)),
        Cell::from(s.parameters.display()),
        Cell::from(created),
    ])
}

/// Summary rows that fit in a terminal `height` lines tall: status bar,
/// view border, strategy tabs, filter line and table header take six.
pub fn table_rows(height: u16) -> usize {
    (height as usize).saturating_sub(6).max(1)
}
