//! Dashboard state: open tabs over the backtest cache plus table/chart view.
//!
//! Closing a tab evicts its cache entry, so reopening it fetches again.
//! Switching tabs never fetches; it only changes which entry is displayed.

use std::sync::Arc;

use crate::api::{ApiResult, BacktestApi};
use crate::cache::{BacktestCache, Completion, EntryState, FetchStart, FetchTicket};
use crate::chart::ChartKind;
use crate::domain::{Backtest, BacktestId};
use crate::table::{signal_rows, Pager, TableTab};
use crate::tabs::OpenTabs;

/// What the dashboard body should render for the selected tab.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedView {
    Empty,
    Loading(BacktestId),
    Failed(BacktestId, String),
    Ready(Arc<Backtest>),
}

#[derive(Debug)]
pub struct Dashboard {
    tabs: OpenTabs,
    cache: BacktestCache,
    pub chart: ChartKind,
    pub table: TableTab,
    trades_pager: Pager,
    signals_pager: Pager,
    page_size: usize,
}

impl Dashboard {
    pub fn new(page_size: usize) -> Self {
        Self {
            tabs: OpenTabs::new(),
            cache: BacktestCache::new(),
            chart: ChartKind::default(),
            table: TableTab::default(),
            trades_pager: Pager::new(page_size, 0),
            signals_pager: Pager::new(page_size, 0),
            page_size,
        }
    }

    /// Replace the open tabs with a persisted set, dropping every cached
    /// entry. Entries are fetched via [`Dashboard::missing_fetches`].
    pub fn restore(&mut self, ids: &[BacktestId], selected: Option<BacktestId>) {
        self.cache.clear();
        self.tabs = OpenTabs::restore(ids, selected);
        self.reset_pagers();
    }

    pub fn tabs(&self) -> &OpenTabs {
        &self.tabs
    }

    pub fn cache(&self) -> &BacktestCache {
        &self.cache
    }

    pub fn selected(&self) -> Option<BacktestId> {
        self.tabs.selected()
    }

    /// Open (or focus) a backtest tab and start its fetch if needed.
    /// Pages are kept when `id` is already the selected tab.
    pub fn open(&mut self, id: BacktestId) -> FetchStart {
        let refocus = self.selected() == Some(id);
        self.tabs.open(id);
        let start = self.cache.begin_fetch(id);
        if !refocus {
            self.reset_pagers();
        }
        start
    }

    /// Tickets for every open tab with no cached or in-flight entry.
    pub fn missing_fetches(&mut self) -> Vec<FetchTicket> {
        let ids: Vec<BacktestId> = self.tabs.ids().to_vec();
        ids.into_iter()
            .filter_map(|id| match self.cache.begin_fetch(id) {
                FetchStart::Started(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn complete(&mut self, ticket: FetchTicket, result: ApiResult<Backtest>) -> Completion {
        let outcome = self.cache.complete(ticket, result);
        if self.selected() == Some(ticket.id()) {
            self.sync_pagers();
        }
        outcome
    }

    /// Close a tab, evicting its entry. Returns the new selection.
    pub fn close(&mut self, id: BacktestId) -> Option<BacktestId> {
        let was_selected = self.selected() == Some(id);
        self.cache.remove(id);
        let next = self.tabs.close(id);
        if was_selected {
            self.reset_pagers();
        }
        next
    }

    pub fn close_selected(&mut self) -> Option<BacktestId> {
        match self.selected() {
            Some(id) => self.close(id),
            None => None,
        }
    }

    pub fn select(&mut self, id: BacktestId) -> bool {
        let changed = self.selected() != Some(id) && self.tabs.select(id);
        if changed {
            self.reset_pagers();
        }
        changed
    }

    pub fn select_next(&mut self) {
        self.tabs.select_next();
        self.reset_pagers();
    }

    pub fn select_prev(&mut self) {
        self.tabs.select_prev();
        self.reset_pagers();
    }

    /// Restart a failed fetch for the selected tab.
    pub fn retry_selected(&mut self) -> Option<FetchTicket> {
        let id = self.selected()?;
        match self.cache.state(id) {
            Some(EntryState::Failed(_)) | None => match self.cache.begin_fetch(id) {
                FetchStart::Started(t) => Some(t),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn view(&self) -> SelectedView {
        let Some(id) = self.selected() else {
            return SelectedView::Empty;
        };
        match self.cache.state(id) {
            Some(EntryState::Ready(bt)) => SelectedView::Ready(Arc::clone(bt)),
            Some(EntryState::Failed(msg)) => SelectedView::Failed(id, msg.clone()),
            Some(EntryState::Pending) | None => SelectedView::Loading(id),
        }
    }

    /// Open and fetch on the calling thread.
    pub fn open_blocking(&mut self, id: BacktestId, api: &dyn BacktestApi) -> SelectedView {
        if let FetchStart::Started(ticket) = self.open(id) {
            self.complete(ticket, api.get_backtest(id));
        }
        self.view()
    }

    /// Pager for the active table, if it paginates.
    pub fn pager(&self) -> Option<&Pager> {
        match self.table {
            TableTab::Overview => None,
            TableTab::Trades => Some(&self.trades_pager),
            TableTab::Signals => Some(&self.signals_pager),
        }
    }

    fn pager_mut(&mut self) -> Option<&mut Pager> {
        match self.table {
            TableTab::Overview => None,
            TableTab::Trades => Some(&mut self.trades_pager),
            TableTab::Signals => Some(&mut self.signals_pager),
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.pager_mut().map(Pager::next).unwrap_or(false)
    }

    pub fn prev_page(&mut self) -> bool {
        self.pager_mut().map(Pager::prev).unwrap_or(false)
    }

    pub fn go_to_page(&mut self, page: usize) {
        if let Some(p) = self.pager_mut() {
            p.go_to(page);
        }
    }

    pub fn set_table(&mut self, table: TableTab) {
        self.table = table;
    }

    pub fn cycle_chart(&mut self) {
        self.chart = self.chart.next();
    }

    fn reset_pagers(&mut self) {
        self.trades_pager = Pager::new(self.page_size, 0);
        self.signals_pager = Pager::new(self.page_size, 0);
        self.sync_pagers();
    }

    fn sync_pagers(&mut self) {
        let (trades, signals) = match self.view() {
            SelectedView::Ready(bt) => (bt.trades.len(), signal_rows(&bt.signals).len()),
            _ => (0, 0),
        };
        self.trades_pager.set_total(trades);
        self.signals_pager.set_total(signals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    fn payload(id: u64, trades: usize) -> Backtest {
        let trades: Vec<serde_json::Value> = (0..trades)
            .map(|i| {
                serde_json::json!({
                    "timestamp": "2024-01-02T00:00:00Z", "trade_id": i, "leg_id": 1,
                    "symbol": "A", "quantity": 1, "price": "1.0", "cost": "1.0", "direction": "LONG"
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({ "id": id, "trades": trades })).unwrap()
    }

    fn started(start: FetchStart) -> FetchTicket {
        match start {
            FetchStart::Started(t) => t,
            other => panic!("expected Started, got {other:?}"),
        }
    }

    #[test]
    fn open_shows_loading_until_complete() {
        let mut d = Dashboard::new(20);
        let id = BacktestId::new(1);
        let t = started(d.open(id));
        assert_eq!(d.view(), SelectedView::Loading(id));
        d.complete(t, Ok(payload(1, 0)));
        assert!(matches!(d.view(), SelectedView::Ready(bt) if bt.id == id));
    }

    #[test]
    fn failure_is_visible_and_retryable() {
        let mut d = Dashboard::new(20);
        let id = BacktestId::new(2);
        let t = started(d.open(id));
        d.complete(t, Err(ApiError::Http { status: 500, detail: "boom".into() }));
        assert!(matches!(d.view(), SelectedView::Failed(_, m) if m.contains("boom")));
        assert!(d.retry_selected().is_some());
        assert_eq!(d.view(), SelectedView::Loading(id));
    }

    #[test]
    fn closing_tab_evicts_and_reselects() {
        let mut d = Dashboard::new(20);
        for raw in [5, 7, 9] {
            let t = started(d.open(BacktestId::new(raw)));
            d.complete(t, Ok(payload(raw, 0)));
        }
        d.select(BacktestId::new(7));
        assert_eq!(d.close(BacktestId::new(7)), Some(BacktestId::new(5)));
        assert!(!d.cache().contains(BacktestId::new(7)));
        assert!(matches!(d.open(BacktestId::new(7)), FetchStart::Started(_)));
    }

    #[test]
    fn closing_during_fetch_discards_result() {
        let mut d = Dashboard::new(20);
        let id = BacktestId::new(3);
        let t = started(d.open(id));
        d.close(id);
        assert_eq!(d.complete(t, Ok(payload(3, 0))), Completion::Stale);
        assert!(d.cache().is_empty());
        assert_eq!(d.view(), SelectedView::Empty);
    }

    #[test]
    fn pager_follows_selected_payload() {
        let mut d = Dashboard::new(20);
        let t = started(d.open(BacktestId::new(1)));
        d.complete(t, Ok(payload(1, 45)));
        d.set_table(TableTab::Trades);
        assert_eq!(d.pager().unwrap().total_pages(), 3);
        assert!(d.next_page());
        assert!(d.next_page());
        assert!(!d.next_page());
        assert_eq!(d.pager().unwrap().page(), 3);

        let t = started(d.open(BacktestId::new(2)));
        d.complete(t, Ok(payload(2, 5)));
        assert_eq!(d.pager().unwrap().page(), 1);
        assert_eq!(d.pager().unwrap().total_pages(), 1);
    }

    #[test]
    fn reopening_selected_tab_keeps_page() {
        let mut d = Dashboard::new(20);
        let t = started(d.open(BacktestId::new(1)));
        d.complete(t, Ok(payload(1, 45)));
        d.open(BacktestId::new(2));
        d.select(BacktestId::new(1));
        d.set_table(TableTab::Trades);
        d.go_to_page(3);
        assert!(matches!(d.open(BacktestId::new(1)), FetchStart::Cached(_)));
        assert_eq!(d.pager().unwrap().page(), 3);

        d.open(BacktestId::new(2));
        d.open(BacktestId::new(1));
        assert_eq!(d.pager().unwrap().page(), 1, "switching away resets pages");
    }

    #[test]
    fn go_to_page_clamps_to_payload() {
        let mut d = Dashboard::new(20);
        let t = started(d.open(BacktestId::new(1)));
        d.complete(t, Ok(payload(1, 45)));
        d.set_table(TableTab::Trades);
        d.go_to_page(99);
        assert_eq!(d.pager().unwrap().page(), 3);
        d.set_table(TableTab::Overview);
        d.go_to_page(2);
        assert!(d.pager().is_none());
    }

    #[test]
    fn restore_drops_previous_entries() {
        let mut d = Dashboard::new(20);
        let t = started(d.open(BacktestId::new(1)));
        d.complete(t, Ok(payload(1, 0)));
        d.restore(&[BacktestId::new(2)], None);
        assert!(d.cache().is_empty());
        assert_eq!(d.missing_fetches().len(), 1);
    }

    #[test]
    fn overview_has_no_pager() {
        let mut d = Dashboard::new(20);
        assert!(d.pager().is_none());
        assert!(!d.next_page());
    }

    #[test]
    fn missing_fetches_after_restore() {
        let mut d = Dashboard::new(20);
        d.restore(&[BacktestId::new(1), BacktestId::new(2)], Some(BacktestId::new(1)));
        let tickets = d.missing_fetches();
        assert_eq!(tickets.len(), 2);
        assert!(d.missing_fetches().is_empty(), "pending entries are not refetched");
    }
}
