//! Line chart panel - equity, return or drawdown over time

use chrono::DateTime;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use backview_core::chart::{bounds, ChartKind};

use crate::theme::Theme;

pub struct LineChartPanel<'a> {
    points: &'a [(f64, f64)],
    kind: ChartKind,
    theme: &'a Theme,
}

impl<'a> LineChartPanel<'a> {
    pub fn new(points: &'a [(f64, f64)], kind: ChartKind, theme: &'a Theme) -> Self {
        Self { points, kind, theme }
    }

    fn format_y(&self, v: f64) -> String {
        match self.kind {
            ChartKind::Equity => format!("{v:.0}"),
            _ => format!("{v:.4}"),
        }
    }
}

/// `YYYY-MM-DD` for a unix-seconds x value.
pub(crate) fn date_label(x: f64) -> String {
    DateTime::from_timestamp(x as i64, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub(crate) fn time_labels<'a>(x: [f64; 2], style: Style) -> Vec<Span<'a>> {
    let mid = (x[0] + x[1]) / 2.0;
    vec![
        Span::styled(date_label(x[0]), style),
        Span::styled(date_label(mid), style),
        Span::styled(date_label(x[1]), style),
    ]
}

pub(crate) fn chart_block<'a>(title: String, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .style(Style::default().bg(theme.background))
}

impl<'a> Widget for LineChartPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(" {} | {} points | [c]ycle ", self.kind.label(), self.points.len());
        let block = chart_block(title, self.theme);

        let Some((x, y)) = bounds(self.points) else {
            Paragraph::new(Span::styled(
                "No equity data for this backtest.",
                Style::default().fg(self.theme.muted),
            ))
            .block(block)
            .render(area, buf);
            return;
        };

        let color = match self.kind {
            ChartKind::Drawdown => self.theme.negative,
            _ => self.theme.accent,
        };
        let datasets = vec![Dataset::default()
            .name(self.kind.label())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(self.points)];

        let axis_style = Style::default().fg(self.theme.muted);
        let y_labels = vec![
            Span::styled(self.format_y(y[0]), axis_style),
            Span::styled(self.format_y((y[0] + y[1]) / 2.0), axis_style),
            Span::styled(self.format_y(y[1]), axis_style),
        ];

        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds(x)
                    .labels(time_labels(x, axis_style)),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled(
                        self.kind.label(),
                        Style::default().fg(self.theme.text_secondary),
                    ))
                    .style(axis_style)
                    .bounds(y)
                    .labels(y_labels),
            )
            .render(area, buf);
    }
}
