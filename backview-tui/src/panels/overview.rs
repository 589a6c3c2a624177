//! Overview panel - summary statistics, two metrics per row

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use backview_core::table::{MetricCell, OverviewRow};

use crate::theme::Theme;

pub struct OverviewPanel<'a> {
    rows: &'a [OverviewRow],
    theme: &'a Theme,
}

impl<'a> OverviewPanel<'a> {
    pub fn new(rows: &'a [OverviewRow], theme: &'a Theme) -> Self {
        Self { rows, theme }
    }

    fn cells(&self, cell: Option<&MetricCell>) -> [Cell<'a>; 2] {
        match cell {
            Some(m) => {
                let color = match m.numeric {
                    Some(v) if v < 0.0 => self.theme.negative,
                    _ => self.theme.text_primary,
                };
                [
                    Cell::from(m.label.clone()).style(Style::default().fg(self.theme.muted)),
                    Cell::from(m.value.clone()).style(Style::default().fg(color)),
                ]
            }
            None => [Cell::from(""), Cell::from("")],
        }
    }
}

impl<'a> Widget for OverviewPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Overview ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|r| {
                let [l_label, l_value] = self.cells(Some(&r.left));
                let [r_label, r_value] = self.cells(r.right.as_ref());
                Row::new(vec![l_label, l_value, r_label, r_value])
            })
            .collect();

        let widths = [
            Constraint::Percentage(30),
            Constraint::Percentage(20),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
        ];

        Table::new(rows, widths)
            .block(block)
            .column_spacing(1)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backview_core::domain::SummaryStats;
    use backview_core::table::overview_grid;

    use crate::panels::buffer_text;

    #[test]
    fn pairs_metrics_side_by_side() {
        let stats: SummaryStats = serde_json::from_str(
            r#"{"net_profit": "1520.50", "sortino_ratio": "1.24", "max_drawdown": "-0.81"}"#,
        )
        .unwrap();
        let rows = overview_grid(&stats);
        let theme = Theme::default();
        let area = Rect::new(0, 0, 80, 6);
        let mut buf = Buffer::empty(area);
        OverviewPanel::new(&rows, &theme).render(area, &mut buf);

        let text = buffer_text(&buf);
        let first = text.lines().nth(1).unwrap();
        assert!(first.contains("Net Profit") && first.contains("Sortino Ratio"));
        assert!(text.contains("-0.81"));
    }
}
