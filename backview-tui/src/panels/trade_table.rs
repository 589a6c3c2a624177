//! Trade table panel - one page of executed trade legs
//!
//! Displays:
//! - Timestamp
//! - Trade / leg ids
//! - Symbol and direction
//! - Quantity, fill price, cost

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use backview_core::domain::Trade;
use backview_core::table::Pager;

use super::page_label;
use crate::theme::Theme;

pub struct TradeTablePanel<'a> {
    trades: &'a [Trade],
    pager: &'a Pager,
    theme: &'a Theme,
}

impl<'a> TradeTablePanel<'a> {
    pub fn new(trades: &'a [Trade], pager: &'a Pager, theme: &'a Theme) -> Self {
        Self { trades, pager, theme }
    }

    fn format_cost(&self, cost: f64) -> String {
        format!("{:+.2}", cost)
    }
}

impl<'a> Widget for TradeTablePanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(
                " Trades ({}) | {} ",
                self.trades.len(),
                page_label(self.pager)
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent))
            .style(Style::default().bg(self.theme.background));

        let header_cells = ["Time", "Trade", "Leg", "Symbol", "Dir", "Qty", "Price", "Cost"]
            .iter()
            .map(|h| {
                Cell::from(*h).style(
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                )
            });
        let header = Row::new(header_cells).height(1);

        let rows = self.pager.slice(self.trades).iter().map(|trade| {
            Row::new(vec![
                Cell::from(trade.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(trade.trade_id.clone()),
                Cell::from(trade.leg_id.clone()),
                Cell::from(trade.symbol.clone()),
                Cell::from(trade.direction.to_string())
                    .style(Style::default().fg(self.theme.direction_color(&trade.direction))),
                Cell::from(format!("{}", trade.quantity)),
                Cell::from(format!("{:.2}", trade.price)),
                Cell::from(self.format_cost(trade.cost))
                    .style(Style::default().fg(self.theme.pnl_color(-trade.cost))),
            ])
            .style(Style::default().fg(self.theme.text_primary))
            .height(1)
        });

        let widths = [
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Min(10),
        ];

        Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .render(area, buf);
    }
}
