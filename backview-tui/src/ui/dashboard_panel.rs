//! Dashboard view — open backtest tabs, header, chart and paginated tables.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Tabs, Wrap};

use backview_core::cache::EntryState;
use backview_core::chart::{line_series, ChartKind, SignalOverlay};
use backview_core::dashboard::SelectedView;
use backview_core::domain::Backtest;
use backview_core::table::{overview_grid, signal_rows, Pager, TableTab};

use crate::app::AppState;
use crate::panels::{
    LineChartPanel, OverviewPanel, SignalChartPanel, SignalsTablePanel, TradeTablePanel,
};
use crate::theme::{self, Theme};
use crate::ui::truncate;

/// How a headline value is coloured.
#[derive(Clone, Copy)]
enum Tone {
    /// Green when non-negative, red otherwise.
    Pnl,
    /// Fees and other costs.
    Cost,
    Plain,
}

#[derive(Clone, Copy)]
enum Format {
    Amount,
    Percent,
    Count,
}

/// Headline metrics shown above the chart, in display order.
const HEADLINE: [(&str, &str, Format, Tone); 5] = [
    ("ending_equity", "Ending Equity", Format::Amount, Tone::Plain),
    ("total_fees", "Fees", Format::Amount, Tone::Cost),
    ("net_profit", "Net Profit", Format::Amount, Tone::Pnl),
    ("total_return", "Return", Format::Percent, Tone::Pnl),
    ("total_trades", "Trades", Format::Count, Tone::Plain),
];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    if app.dashboard.tabs().is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("No backtests open.", theme::muted())),
            Line::from(Span::styled(
                "Press 1 and Enter on a summary row to open one.",
                theme::muted(),
            )),
        ];
        f.render_widget(Paragraph::new(text), area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    render_tab_bar(f, chunks[0], app);

    match app.dashboard.view() {
        SelectedView::Empty => {}
        SelectedView::Loading(id) => {
            let text = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(format!("Loading backtest {id}..."), theme::warning())),
            ]);
            f.render_widget(text, chunks[1]);
        }
        SelectedView::Failed(id, msg) => {
            let text = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("Failed to load backtest {id}: {msg}"),
                    theme::negative(),
                )),
                Line::from(Span::styled("[R] retry  [x] close tab", theme::muted())),
            ])
            .wrap(Wrap { trim: true });
            f.render_widget(text, chunks[1]);
        }
        SelectedView::Ready(bt) => render_backtest(f, chunks[1], app, &bt),
    }
}

fn render_tab_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let cache = app.dashboard.cache();
    let titles: Vec<Line> = app
        .dashboard
        .tabs()
        .ids()
        .iter()
        .map(|&id| {
            let prefix = match cache.state(id) {
                Some(EntryState::Ready(_)) => "",
                Some(EntryState::Failed(_)) => "! ",
                Some(EntryState::Pending) | None => "… ",
            };
            Line::from(format!(" {prefix}{} ", truncate(&app.tab_title(id), 28)))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.dashboard.tabs().selected_index().unwrap_or(0))
        .style(theme::muted())
        .highlight_style(theme::accent_bold())
        .divider(Span::styled("|", theme::muted()));
    f.render_widget(tabs, area);
}

fn render_backtest(f: &mut Frame, area: Rect, app: &AppState, bt: &Backtest) {
    let theme = Theme::parrot_neon();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),      // title + parameters
            Constraint::Length(1),      // headline metrics
            Constraint::Percentage(50), // chart
            Constraint::Min(5),         // table
        ])
        .split(area);

    render_header(f, chunks[0], bt);
    render_headline(f, chunks[1], bt);
    render_chart(f, chunks[2], app.dashboard.chart, bt, &theme);
    render_table(f, chunks[3], app, bt, &theme);
}

fn render_header(f: &mut Frame, area: Rect, bt: &Backtest) {
    let params = bt.parameters.display();
    let lines = vec![
        Line::from(vec![
            Span::styled(bt.title(), theme::accent_bold()),
            Span::styled(format!("  symbols: {}", bt.symbols().join(", ")), theme::muted()),
        ]),
        Line::from(Span::styled(
            if params.is_empty() { "no parameters".to_string() } else { params },
            theme::neutral(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_headline(f: &mut Frame, area: Rect, bt: &Backtest) {
    let mut spans: Vec<Span> = Vec::new();
    for (key, label, format, tone) in HEADLINE {
        let Some(value) = bt.summary_stats.get(key) else {
            continue;
        };
        spans.push(Span::styled(format!("{label}: "), theme::muted()));
        let text = match (value.as_f64(), format) {
            (Some(v), Format::Percent) => format!("{v:.2}%"),
            (Some(v), Format::Count) => format!("{v:.0}"),
            _ => value.display(),
        };
        let style = match (tone, value.as_f64()) {
            (Tone::Pnl, Some(v)) => theme::metric_color(v),
            (Tone::Cost, Some(_)) => theme::warning(),
            _ => theme::neutral(),
        };
        spans.push(Span::styled(text, style));
        spans.push(Span::raw("   "));
    }
    if spans.is_empty() {
        spans.push(Span::styled("No summary statistics.", theme::muted()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chart(f: &mut Frame, area: Rect, kind: ChartKind, bt: &Backtest, theme: &Theme) {
    if kind == ChartKind::Signals {
        let overlay = SignalOverlay::build(&bt.price_data, &bt.signals);
        f.render_widget(SignalChartPanel::new(&overlay, theme), area);
    } else {
        let points = line_series(kind, &bt.equity_data);
        f.render_widget(LineChartPanel::new(&points, kind, theme), area);
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &AppState, bt: &Backtest, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let titles: Vec<Line> = TableTab::all()
        .iter()
        .map(|t| Line::from(format!(" {} ", t.label())))
        .collect();
    let selected = TableTab::all()
        .iter()
        .position(|t| *t == app.dashboard.table)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(theme::muted())
        .highlight_style(theme::accent_bold())
        .divider(Span::styled("|", theme::muted()));
    f.render_widget(tabs, chunks[0]);

    let fallback = Pager::default();
    let pager = app.dashboard.pager().unwrap_or(&fallback);
    match app.dashboard.table {
        TableTab::Overview => {
            let rows = overview_grid(&bt.summary_stats);
            f.render_widget(OverviewPanel::new(&rows, theme), chunks[1]);
        }
        TableTab::Trades => {
            let page = pager.slice(&bt.trades);
            f.render_widget(TradeTablePanel::new(page, pager, theme), chunks[1]);
        }
        TableTab::Signals => {
            let rows = signal_rows(&bt.signals);
            let page = pager.slice(&rows);
            f.render_widget(SignalsTablePanel::new(page, pager, theme), chunks[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use backview_core::cache::FetchStart;
    use backview_core::domain::{BacktestId, MetricValue, SummaryStats};

    use crate::panels::buffer_text;

    fn app() -> AppState {
        let (cmd_tx, _cmd_rx) = mpsc::channel();
        let (_resp_tx, resp_rx) = mpsc::channel();
        AppState::new(cmd_tx, resp_rx, 20)
    }

    fn backtest(id: u64) -> Backtest {
        Backtest {
            id: BacktestId::new(id),
            strategy_name: Some("ZScore".into()),
            parameters: Default::default(),
            summary_stats: SummaryStats::new(vec![
                ("total_return".into(), MetricValue::Number(12.5)),
                ("total_trades".into(), MetricValue::Number(4.0)),
                ("total_fees".into(), MetricValue::Text("42.5".into())),
                ("net_profit".into(), MetricValue::Number(-310.0)),
                ("ending_equity".into(), MetricValue::Text("99690.00".into())),
                ("sortino_ratio".into(), MetricValue::Number(1.4)),
            ]),
            equity_data: Vec::new(),
            price_data: Vec::new(),
            trades: Vec::new(),
            signals: Vec::new(),
        }
    }

    fn render_text(app: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render(f, f.area(), app)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn empty_dashboard_explains_how_to_open() {
        assert!(render_text(&app()).contains("No backtests open"));
    }

    #[test]
    fn ready_backtest_shows_header_and_headline() {
        let mut app = app();
        let id = BacktestId::new(7);
        let FetchStart::Started(ticket) = app.dashboard.open(id) else {
            panic!("expected a fresh fetch");
        };
        app.dashboard.complete(ticket, Ok(backtest(7)));
        let text = render_text(&app);
        assert!(text.contains("ZScore #7"));
        assert!(text.contains("Return: 12.50%"));
        assert!(text.contains("Ending Equity: 99690.00"));
        assert!(text.contains("Fees: 42.50"));
        assert!(text.contains("Net Profit: -310.00"));
        assert!(text.contains("Trades: 4 "));
        assert!(
            text.find("Ending Equity").unwrap() < text.find("Trades:").unwrap(),
            "headline keeps display order"
        );
    }

    #[test]
    fn failed_backtest_offers_retry() {
        let mut app = app();
        let id = BacktestId::new(9);
        let FetchStart::Started(ticket) = app.dashboard.open(id) else {
            panic!("expected a fresh fetch");
        };
        app.dashboard.complete(
            ticket,
            Err(backview_core::ApiError::Http {
                status: 404,
                detail: "Not found.".into(),
            }),
        );
        let text = render_text(&app);
        assert!(text.contains("Failed to load backtest 9"));
        assert!(text.contains("[R] retry"));
    }
}
