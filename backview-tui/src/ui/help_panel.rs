//! Help view — keyboard shortcuts.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global Navigation");
    key(&mut lines, "1 / 2 / 3", "Strategies / Dashboard / Help");
    key(&mut lines, "Tab / Shift+Tab", "Cycle views forward / back");
    key(&mut lines, "e", "Open error history overlay");
    key(&mut lines, "q / Ctrl+C", "Quit (open tabs are saved)");
    lines.push(Line::from(""));

    section(&mut lines, "Strategies");
    key(&mut lines, "h / l", "Previous / next strategy tab");
    key(&mut lines, "j / k", "Move cursor down / up");
    key(&mut lines, "Enter", "Open backtest in the dashboard");
    key(&mut lines, "i", "Show summary detail");
    key(&mut lines, "/", "Filter by id or parameters");
    key(&mut lines, "Esc", "Clear filter");
    key(&mut lines, "r", "Reload summaries from the server");
    lines.push(Line::from(""));

    section(&mut lines, "Dashboard");
    key(&mut lines, "[ / ]", "Previous / next backtest tab");
    key(&mut lines, "x", "Close backtest tab");
    key(&mut lines, "c", "Cycle chart (equity, return, drawdown, signals)");
    key(&mut lines, "o / t / s", "Overview / Trades / Signals table");
    key(&mut lines, "n / p", "Next / previous table page");
    key(&mut lines, "R", "Retry a failed load");
    lines.push(Line::from(""));

    section(&mut lines, "Signal Markers");
    key(&mut lines, "▲ green", "Long entry");
    key(&mut lines, "▼ red", "Short entry");
    key(&mut lines, "▼ green", "Sell (exit long)");
    key(&mut lines, "▲ red", "Cover (exit short)");

    let para = Paragraph::new(lines);
    f.render_widget(para, area);
}

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key<'a>(lines: &mut Vec<Line<'a>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>20}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
