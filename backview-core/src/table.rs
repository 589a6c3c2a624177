//! Table shaping: pagination, the overview grid, flattened signal rows.

use std::ops::Range;

use chrono::{DateTime, Utc};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::domain::{Direction, MetricValue, Signal, SummaryStats};

/// Which table the dashboard shows under the charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableTab {
    #[default]
    Overview,
    Trades,
    Signals,
}

impl TableTab {
    pub fn label(self) -> &'static str {
        match self {
            TableTab::Overview => "Overview",
            TableTab::Trades => "Trades",
            TableTab::Signals => "Signals",
        }
    }

    pub fn all() -> [TableTab; 3] {
        [TableTab::Overview, TableTab::Trades, TableTab::Signals]
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overview" => Some(TableTab::Overview),
            "trades" => Some(TableTab::Trades),
            "signals" => Some(TableTab::Signals),
            _ => None,
        }
    }
}

/// 1-based page cursor over `total` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    page: usize,
    total: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, 0)
    }
}

impl Pager {
    pub fn new(page_size: usize, total: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
            total,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// `ceil(total / page_size)`; zero when there are no rows.
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    /// Highest navigable page (at least 1 so an empty table still has a page).
    pub fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Advance one page; a no-op on the last page. Returns whether it moved.
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page; a no-op on page 1. Returns whether it moved.
    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`, clamped to `[1, last_page]`.
    pub fn go_to(&mut self, page: usize) {
        self.page = page.clamp(1, self.last_page());
    }

    /// Change the row count and re-clamp the current page.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.page = self.page.clamp(1, self.last_page());
    }

    /// Row indices shown on the current page.
    pub fn range(&self) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let r = self.range();
        &rows[r.start.min(rows.len())..r.end.min(rows.len())]
    }
}

/// One labelled metric cell in the overview grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCell {
    pub label: String,
    pub value: String,
    pub numeric: Option<f64>,
}

/// Overview row holding two metrics side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewRow {
    pub left: MetricCell,
    pub right: Option<MetricCell>,
}

/// Reshape a flat metric map into rows of two for display density.
pub fn overview_grid(stats: &SummaryStats) -> Vec<OverviewRow> {
    let cells: Vec<MetricCell> = stats
        .iter()
        .map(|(name, value)| metric_cell(name, value))
        .collect();
    let mut rows = Vec::with_capacity(cells.len().div_ceil(2));
    let mut iter = cells.into_iter();
    while let Some(left) = iter.next() {
        rows.push(OverviewRow {
            left,
            right: iter.next(),
        });
    }
    rows
}

fn metric_cell(name: &str, value: &MetricValue) -> MetricCell {
    MetricCell {
        label: metric_label(name),
        value: value.display(),
        numeric: value.as_f64(),
    }
}

/// `"avg_win_percent"` → `"Avg Win Percent"`.
pub fn metric_label(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A trade instruction joined with its signal's timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub direction: Direction,
    pub leg_id: String,
    pub allocation_percent: f64,
}

/// Flatten signals into one row per trade instruction, in input order.
pub fn signal_rows(signals: &[Signal]) -> Vec<SignalRow> {
    signals
        .iter()
        .flat_map(|s| {
            s.trade_instructions.iter().map(move |ti| SignalRow {
                timestamp: s.timestamp,
                ticker: ti.ticker.clone(),
                direction: ti.direction.clone(),
                leg_id: ti.leg_id.clone(),
                allocation_percent: ti.allocation_percent,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_for_45_rows() {
        let mut p = Pager::new(20, 45);
        assert_eq!(p.total_pages(), 3);
        assert!(!p.prev(), "previous from page 1 stays on 1");
        assert_eq!(p.page(), 1);
        assert!(p.next());
        assert!(p.next());
        assert_eq!(p.page(), 3);
        assert!(!p.next(), "next from last page stays");
        assert_eq!(p.page(), 3);
        assert_eq!(p.range(), 40..45);
    }

    #[test]
    fn empty_table_has_one_page() {
        let mut p = Pager::new(20, 0);
        assert_eq!(p.total_pages(), 0);
        assert_eq!(p.last_page(), 1);
        assert!(!p.has_next() && !p.has_prev());
        assert!(!p.next());
        assert_eq!(p.range(), 0..0);
    }

    #[test]
    fn shrinking_total_reclamps() {
        let mut p = Pager::new(10, 100);
        p.go_to(10);
        p.set_total(25);
        assert_eq!(p.page(), 3);
        p.go_to(0);
        assert_eq!(p.page(), 1);
    }

    #[test]
    fn slice_returns_page_rows() {
        let rows: Vec<u32> = (0..25).collect();
        let mut p = Pager::new(20, rows.len());
        assert_eq!(p.slice(&rows).len(), 20);
        p.next();
        assert_eq!(p.slice(&rows), &[20, 21, 22, 23, 24]);
    }

    #[test]
    fn overview_pairs_metrics() {
        let stats = SummaryStats::new(vec![
            ("total_return".into(), MetricValue::Number(0.1234)),
            ("total_trades".into(), MetricValue::Number(40.0)),
            ("sortino_ratio".into(), MetricValue::Missing),
        ]);
        let rows = overview_grid(&stats);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].left.label, "Total Return");
        assert_eq!(rows[0].left.value, "0.12");
        assert_eq!(rows[0].right.as_ref().unwrap().label, "Total Trades");
        assert_eq!(rows[1].left.value, "-");
        assert!(rows[1].right.is_none());
    }

    #[test]
    fn labels_title_case_snake_names() {
        assert_eq!(metric_label("avg_win_percent"), "Avg Win Percent");
        assert_eq!(metric_label("beta"), "Beta");
    }

    #[test]
    fn table_tab_parse() {
        assert_eq!(TableTab::parse("Trades"), Some(TableTab::Trades));
        assert_eq!(TableTab::parse("x"), None);
    }
}
