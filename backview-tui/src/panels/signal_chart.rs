//! Signal chart panel - price line per symbol with direction markers
//!
//! Ratatui's Chart draws the price lines; the ▲/▼/● markers are written
//! straight into the buffer afterwards at positions computed from the same
//! axis bounds, since Dataset markers cannot carry per-point glyphs. Each
//! marker is labelled with its direction, right of the glyph when it fits
//! and left of it otherwise.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget},
};

use backview_core::chart::{bounds, SignalOverlay};

use super::chart::{chart_block, time_labels};
use crate::theme::{self, Theme};

pub struct SignalChartPanel<'a> {
    overlay: &'a SignalOverlay,
    theme: &'a Theme,
}

impl<'a> SignalChartPanel<'a> {
    pub fn new(overlay: &'a SignalOverlay, theme: &'a Theme) -> Self {
        Self { overlay, theme }
    }

    fn marker_count(&self) -> usize {
        self.overlay.series.iter().map(|s| s.markers.len()).sum()
    }
}

impl<'a> Widget for SignalChartPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(
            " Signals | {} symbols | {} markers | [c]ycle ",
            self.overlay.series.len(),
            self.marker_count()
        );
        let block = chart_block(title, self.theme);
        let inner = block.inner(area);

        let all = self.overlay.all_points();
        let Some((x, y)) = bounds(&all) else {
            Paragraph::new(Span::styled(
                "No price data for this backtest.",
                Style::default().fg(self.theme.muted),
            ))
            .block(block)
            .render(area, buf);
            return;
        };

        let datasets: Vec<Dataset> = self
            .overlay
            .series
            .iter()
            .map(|s| {
                Dataset::default()
                    .name(s.symbol.as_str())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(theme::series_color(s.color)))
                    .data(&s.points)
            })
            .collect();

        let axis_style = Style::default().fg(self.theme.muted);
        let y_text = [format!("{:.2}", y[0]), format!("{:.2}", y[1])];
        let y_label_width = y_text.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
        let y_labels: Vec<Span> = y_text
            .into_iter()
            .map(|l| Span::styled(l, axis_style))
            .collect();

        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds(x)
                    .labels(time_labels(x, axis_style)),
            )
            .y_axis(Axis::default().style(axis_style).bounds(y).labels(y_labels))
            .render(area, buf);

        // Plot area: inner minus the y label column + axis line, and the
        // x label row + axis line at the bottom.
        let plot_left = inner.x + y_label_width + 1;
        let plot_width = inner.width.saturating_sub(y_label_width + 1);
        let plot_height = inner.height.saturating_sub(2);
        if plot_width < 2 || plot_height < 2 {
            return;
        }

        for series in &self.overlay.series {
            for marker in &series.markers {
                let fx = (marker.x - x[0]) / (x[1] - x[0]);
                let fy = (marker.y - y[0]) / (y[1] - y[0]);
                if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
                    continue;
                }
                let px = plot_left + (fx * f64::from(plot_width - 1)).round() as u16;
                let py = inner.y + (plot_height - 1)
                    - (fy * f64::from(plot_height - 1)).round() as u16;
                let style = Style::default()
                    .fg(theme::marker_color(marker.style.color))
                    .add_modifier(Modifier::BOLD);
                buf.set_string(px, py, marker.style.shape.glyph(), style);

                let label = marker.direction.as_str();
                let width = label.chars().count() as u16;
                let plot_right = plot_left + plot_width;
                let label_x = if px + 1 + width <= plot_right {
                    Some(px + 1)
                } else {
                    px.checked_sub(width).filter(|&lx| lx >= plot_left)
                };
                if let Some(lx) = label_x {
                    buf.set_string(lx, py, label, style.remove_modifier(Modifier::BOLD));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backview_core::domain::Backtest;

    use crate::panels::buffer_text;

    fn backtest() -> Backtest {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "price_data": [
                {"symbol": "HE.n.0", "timestamp": "2024-01-03T00:00:00Z", "close": "79.75"},
                {"symbol": "HE.n.0", "timestamp": "2024-01-02T00:00:00Z", "close": "80.50"},
                {"symbol": "HE.n.0", "timestamp": "2024-01-04T00:00:00Z", "close": "81.20"}
            ],
            "signals": [
                {"timestamp": "2024-01-02T00:00:00Z", "trade_instructions": [
                    {"ticker": "HE.n.0", "direction": "LONG", "leg_id": 1, "allocation_percent": 0.05}
                ]},
                {"timestamp": "2024-01-04T00:00:00Z", "trade_instructions": [
                    {"ticker": "HE.n.0", "direction": "SELL", "leg_id": 1, "allocation_percent": 0.0}
                ]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn markers_are_drawn_over_price_lines() {
        let theme = Theme::default();
        let bt = backtest();
        let overlay = SignalOverlay::build(&bt.price_data, &bt.signals);
        let area = Rect::new(0, 0, 100, 24);
        let mut buf = Buffer::empty(area);
        SignalChartPanel::new(&overlay, &theme).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains('▲'), "LONG marker should render");
        assert!(text.contains('▼'), "SELL marker should render");
        assert!(text.contains("2 markers"));
    }

    #[test]
    fn markers_carry_direction_labels() {
        let theme = Theme::default();
        let bt = backtest();
        let overlay = SignalOverlay::build(&bt.price_data, &bt.signals);
        let area = Rect::new(0, 0, 100, 24);
        let mut buf = Buffer::empty(area);
        SignalChartPanel::new(&overlay, &theme).render(area, &mut buf);

        let text = buffer_text(&buf);
        let long_row = text.lines().find(|l| l.contains('▲')).unwrap();
        assert!(long_row.contains("▲LONG"), "{long_row}");
        let sell_row = text.lines().find(|l| l.contains('▼')).unwrap();
        assert!(sell_row.contains("SELL▼"), "label moves left at the right edge: {sell_row}");
    }

    #[test]
    fn tiny_area_does_not_panic() {
        let theme = Theme::default();
        let bt = backtest();
        let overlay = SignalOverlay::build(&bt.price_data, &bt.signals);
        let area = Rect::new(0, 0, 6, 3);
        let mut buf = Buffer::empty(area);
        SignalChartPanel::new(&overlay, &theme).render(area, &mut buf);
    }

    #[test]
    fn no_price_data_shows_placeholder() {
        let theme = Theme::default();
        let overlay = SignalOverlay::default();
        let area = Rect::new(0, 0, 60, 8);
        let mut buf = Buffer::empty(area);
        SignalChartPanel::new(&overlay, &theme).render(area, &mut buf);
        assert!(buffer_text(&buf).contains("No price data"));
    }
}
