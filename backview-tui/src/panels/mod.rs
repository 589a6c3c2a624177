//! Dashboard widgets
//!
//! - LineChart: equity, return or drawdown over time
//! - SignalChart: per-symbol price lines with trade-instruction markers
//! - TradeTable / SignalsTable: paginated trade and signal tapes
//! - Overview: two-metrics-per-row summary statistics grid

pub mod chart;
pub mod overview;
pub mod signal_chart;
pub mod signals_table;
pub mod trade_table;

pub use chart::LineChartPanel;
pub use overview::OverviewPanel;
pub use signal_chart::SignalChartPanel;
pub use signals_table::SignalsTablePanel;
pub use trade_table::TradeTablePanel;

use backview_core::table::Pager;

/// Title suffix shared by the paginated tables.
pub(crate) fn page_label(pager: &Pager) -> String {
    format!(
        "page {}/{} {}{}",
        pager.page(),
        pager.last_page(),
        if pager.has_prev() { "[p]rev " } else { "" },
        if pager.has_next() { "[n]ext" } else { "" },
    )
}

#[cfg(test)]
pub(crate) fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    let area = buf.area;
    let mut content = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            if let Some(cell) = buf.cell((area.x + x, area.y + y)) {
                content.push_str(cell.symbol());
            }
        }
        content.push('\n');
    }
    content
}
