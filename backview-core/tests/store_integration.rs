//! Integration tests for the stores and dashboard over an in-memory backend.

mod common;

use backview_core::chart::{self, ChartKind, MarkerColor, MarkerShape, SignalOverlay};
use backview_core::dashboard::{Dashboard, SelectedView};
use backview_core::domain::{BacktestId, Direction};
use backview_core::summaries::{LoadState, SummariesStore};
use backview_core::table::{overview_grid, signal_rows, TableTab};
use backview_core::BacktestApi;
use common::MockApi;

fn id(raw: u64) -> BacktestId {
    BacktestId::new(raw)
}

#[test]
fn fixture_payload_decodes_fully() {
    let bt = common::load_backtest();
    assert_eq!(bt.summary_stats.len(), 19);
    assert_eq!(bt.equity_data.len(), 3);
    assert_eq!(bt.symbols(), vec!["HE.n.0", "ZC.n.0"]);
    assert_eq!(bt.trades[2].direction, Direction::Sell);
    assert_eq!(bt.signals[0].trade_instructions.len(), 2);
}

#[test]
fn summaries_load_once_and_group_in_first_seen_order() {
    let api = MockApi::with_fixtures();
    let mut store = SummariesStore::new();
    assert_eq!(store.load_with(&api), &LoadState::Ready);
    store.load_with(&api);
    assert_eq!(api.list_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    let groups = store.groups();
    assert_eq!(groups.names(), vec!["MeanReversion", "CointegrationZScore"]);
    let ids: Vec<u64> = groups
        .get("MeanReversion")
        .unwrap()
        .iter()
        .map(|s| s.id.get())
        .collect();
    assert_eq!(ids, vec![3, 4]);

    store.reload();
    store.load_with(&api);
    assert_eq!(api.list_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[test]
fn reopening_open_tab_does_not_refetch() {
    let api = MockApi::with_fixtures();
    let mut dash = Dashboard::new(20);
    dash.open_blocking(id(1), &api);
    dash.open_blocking(id(2), &api);
    dash.open_blocking(id(1), &api);
    assert_eq!(api.gets(), 2);
    assert_eq!(dash.tabs().ids(), &[id(1), id(2)]);
    assert_eq!(dash.selected(), Some(id(1)));
}

#[test]
fn closed_tab_is_refetched_on_reopen() {
    let api = MockApi::with_fixtures();
    let mut dash = Dashboard::new(20);
    dash.open_blocking(id(3), &api);
    dash.close(id(3));
    assert_eq!(dash.view(), SelectedView::Empty);
    dash.open_blocking(id(3), &api);
    assert_eq!(api.gets(), 2);
}

#[test]
fn failed_fetch_then_retry_succeeds() {
    let api = MockApi::with_fixtures();
    api.fail(id(4));
    let mut dash = Dashboard::new(20);
    match dash.open_blocking(id(4), &api) {
        SelectedView::Failed(failed, msg) => {
            assert_eq!(failed, id(4));
            assert!(msg.contains("500"));
        }
        other => panic!("expected failure, got {other:?}"),
    }

    api.heal(id(4));
    let ticket = dash.retry_selected().unwrap();
    dash.complete(ticket, api.get_backtest(id(4)));
    assert!(matches!(dash.view(), SelectedView::Ready(bt) if bt.id == id(4)));
}

#[test]
fn unknown_id_surfaces_not_found() {
    let api = MockApi::with_fixtures();
    let mut dash = Dashboard::new(20);
    let view = dash.open_blocking(id(99), &api);
    assert!(matches!(view, SelectedView::Failed(_, msg) if msg.contains("Not found")));
}

#[test]
fn views_derive_from_cached_payload() {
    let api = MockApi::with_fixtures();
    let mut dash = Dashboard::new(2);
    let SelectedView::Ready(bt) = dash.open_blocking(id(1), &api) else {
        panic!("fixture backtest should load");
    };

    let rows = overview_grid(&bt.summary_stats);
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].left.label, "Net Profit");
    assert_eq!(rows[0].left.value, "1520.50");
    assert!(rows[9].right.is_none());

    let signals = signal_rows(&bt.signals);
    assert_eq!(signals.len(), 4);

    dash.set_table(TableTab::Signals);
    assert_eq!(dash.pager().unwrap().total_pages(), 2);
    dash.set_table(TableTab::Trades);
    assert_eq!(dash.pager().unwrap().total_pages(), 2);

    let drawdown = chart::line_series(ChartKind::Drawdown, &bt.equity_data);
    assert_eq!(drawdown.len(), 3);
    assert!((drawdown[1].1 + 0.00812).abs() < 1e-9);

    let overlay = SignalOverlay::build(&bt.price_data, &bt.signals);
    assert_eq!(overlay.series.len(), 2);
    let he = &overlay.series[0];
    assert_eq!(he.markers.len(), 2);
    assert_eq!(he.markers[0].y, 80.5);
    assert_eq!(he.markers[0].style.color, MarkerColor::Green);
    assert_eq!(he.markers[1].style.shape, MarkerShape::ArrowDown);
    let zc = &overlay.series[1];
    assert_eq!(zc.markers[0].style.color, MarkerColor::Red);
    assert_eq!(zc.markers[1].style.shape, MarkerShape::ArrowUp);
}

#[test]
fn mock_login_checks_credentials() {
    let api = MockApi::with_fixtures();
    assert_eq!(api.login("admin", "secret").unwrap(), "token-abc");
    assert!(api.login("admin", "wrong").is_err());
}
