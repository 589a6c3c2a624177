//! Signals table panel - trade instructions flattened one per row

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use backview_core::table::{Pager, SignalRow};

use super::page_label;
use crate::theme::Theme;

pub struct SignalsTablePanel<'a> {
    rows: &'a [SignalRow],
    pager: &'a Pager,
    theme: &'a Theme,
}

impl<'a> SignalsTablePanel<'a> {
    pub fn new(rows: &'a [SignalRow], pager: &'a Pager, theme: &'a Theme) -> Self {
        Self { rows, pager, theme }
    }
}

impl<'a> Widget for SignalsTablePanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(
                " Signals ({} instructions) | {} ",
                self.rows.len(),
                page_label(self.pager)
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));

        let header = Row::new(["Time", "Ticker", "Direction", "Leg", "Allocation"].iter().map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        }));

        let rows = self.pager.slice(self.rows).iter().map(|r| {
            Row::new(vec![
                Cell::from(r.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(r.ticker.clone()),
                Cell::from(r.direction.to_string())
                    .style(Style::default().fg(self.theme.direction_color(&r.direction))),
                Cell::from(r.leg_id.clone()),
                Cell::from(format!("{:.2}%", r.allocation_percent * 100.0)),
            ])
            .style(Style::default().fg(self.theme.text_primary))
        });

        let widths = [
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Min(10),
        ];

        Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .render(area, buf);
    }
}
