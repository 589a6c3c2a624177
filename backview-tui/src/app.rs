//! Application state — single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels;
//! its results enter the stores through [`AppState::apply_response`].

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};

use chrono::NaiveDateTime;

use backview_core::api::ApiError;
use backview_core::cache::{Completion, FetchStart, FetchTicket};
use backview_core::dashboard::Dashboard;
use backview_core::domain::{BacktestId, Summary};
use backview_core::summaries::{LoadState, StrategyGroup, SummariesStore};

use crate::worker::{WorkerCommand, WorkerResponse};

const ERROR_HISTORY_CAP: usize = 50;

/// Which view is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Strategies,
    Dashboard,
    Help,
}

impl View {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            View::Strategies => 0,
            View::Dashboard => 1,
            View::Help => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(View::Strategies),
            1 => Some(View::Dashboard),
            2 => Some(View::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Strategies => "Strategies",
            View::Dashboard => "Dashboard",
            View::Help => "Help",
        }
    }

    pub fn next(self) -> View {
        View::from_index((self.index() + 1) % Self::COUNT).unwrap_or(View::Strategies)
    }

    pub fn prev(self) -> View {
        View::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap_or(View::Strategies)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Http,
    Auth,
    Data,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Http => "HTTP",
            ErrorCategory::Auth => "AUTH",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Other => "ERR",
        }
    }

    pub fn of(err: &ApiError) -> Self {
        match err.category() {
            "network" => ErrorCategory::Network,
            "http" => ErrorCategory::Http,
            "auth" => ErrorCategory::Auth,
            "data" => ErrorCategory::Data,
            _ => ErrorCategory::Other,
        }
    }
}

/// Strategy view state: which strategy tab, which row, optional filter.
#[derive(Debug, Clone, Default)]
pub struct StrategyViewState {
    pub tab: usize,
    pub cursor: usize,
    /// First summary row shown in the table.
    pub scroll_offset: usize,
    /// Table rows that fit on screen, refreshed from the terminal size.
    pub viewport: usize,
    /// Case-insensitive substring matched against id and parameters.
    pub filter: String,
    /// Strategy name to reselect once summaries arrive.
    pub pending_strategy: Option<String>,
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    ErrorHistory,
    Search,
    Detail(BacktestId),
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub view: View,
    pub running: bool,

    // Stores
    pub store: SummariesStore,
    pub strategies: StrategyViewState,
    pub dashboard: Dashboard,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
    pub search_input: String,

    // Session
    pub token: Option<String>,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        page_size: usize,
    ) -> Self {
        Self {
            view: View::Strategies,
            running: true,
            store: SummariesStore::new(),
            strategies: StrategyViewState::default(),
            dashboard: Dashboard::new(page_size),
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            search_input: String::new(),
            token: None,
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    /// Set an info status message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    /// Set a warning status message.
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    fn send(&mut self, cmd: WorkerCommand) {
        if self.worker_tx.send(cmd).is_err() {
            tracing::error!("worker channel closed");
            self.push_error(
                ErrorCategory::Other,
                "Background worker stopped; restart the app".into(),
                "worker".into(),
            );
        }
    }

    // ── Summaries ────────────────────────────────────────────────────

    /// Ask the worker for the summary listing unless it is held or loading.
    pub fn request_summaries(&mut self) {
        if let Some(ticket) = self.store.begin_load() {
            self.send(WorkerCommand::LoadSummaries { ticket });
            self.set_status("Loading summaries...");
        }
    }

    pub fn reload_summaries(&mut self) {
        self.strategies.pending_strategy = self.selected_group().map(|g| g.name.clone());
        self.store.reload();
        self.request_summaries();
    }

    pub fn selected_group(&self) -> Option<&StrategyGroup> {
        self.store.groups().group_at(self.strategies.tab)
    }

    /// Rows shown in the strategy table after applying the filter.
    pub fn visible_summaries(&self) -> Vec<&Summary> {
        let Some(group) = self.selected_group() else {
            return Vec::new();
        };
        let needle = self.strategies.filter.trim().to_lowercase();
        group
            .summaries
            .iter()
            .filter(|s| {
                needle.is_empty()
                    || s.id.to_string().contains(&needle)
                    || s.parameters.display().to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn cursor_summary(&self) -> Option<&Summary> {
        self.visible_summaries().get(self.strategies.cursor).copied()
    }

    pub fn next_strategy(&mut self) {
        let n = self.store.groups().len();
        if n > 0 {
            self.strategies.tab = (self.strategies.tab + 1) % n;
            self.reset_cursor();
        }
    }

    pub fn prev_strategy(&mut self) {
        let n = self.store.groups().len();
        if n > 0 {
            self.strategies.tab = (self.strategies.tab + n - 1) % n;
            self.reset_cursor();
        }
    }

    pub fn cursor_down(&mut self) {
        let rows = self.visible_summaries().len();
        if rows > 0 && self.strategies.cursor + 1 < rows {
            self.strategies.cursor += 1;
        }
        self.follow_cursor();
    }

    pub fn cursor_up(&mut self) {
        self.strategies.cursor = self.strategies.cursor.saturating_sub(1);
        self.follow_cursor();
    }

    /// Record how many summary rows fit on screen.
    pub fn set_viewport(&mut self, rows: usize) {
        if self.strategies.viewport != rows {
            self.strategies.viewport = rows;
            self.follow_cursor();
        }
    }

    fn follow_cursor(&mut self) {
        let s = &mut self.strategies;
        s.scroll_offset = scroll_window(s.scroll_offset, s.cursor, s.viewport.max(1));
    }

    pub fn set_filter(&mut self, filter: String) {
        self.strategies.filter = filter;
        self.reset_cursor();
    }

    fn reset_cursor(&mut self) {
        self.strategies.cursor = 0;
        self.strategies.scroll_offset = 0;
    }

    fn clamp_strategy_selection(&mut self) {
        if let Some(name) = self.strategies.pending_strategy.take() {
            if let Some(idx) = self.store.groups().position(&name) {
                self.strategies.tab = idx;
            }
        }
        let n = self.store.groups().len();
        if self.strategies.tab >= n {
            self.strategies.tab = 0;
        }
        let rows = self.visible_summaries().len();
        if self.strategies.cursor >= rows {
            self.strategies.cursor = rows.saturating_sub(1);
        }
        self.follow_cursor();
    }

    // ── Dashboard ────────────────────────────────────────────────────

    /// Open a backtest tab (dedup), fetch it if needed, show the dashboard.
    pub fn open_backtest(&mut self, id: BacktestId) {
        match self.dashboard.open(id) {
            FetchStart::Started(ticket) => {
                self.send(WorkerCommand::FetchBacktest { ticket });
                self.set_status(format!("Loading backtest {id}..."));
            }
            FetchStart::Cached(bt) => self.set_status(format!("Showing {}", bt.title())),
            FetchStart::InFlight => self.set_status(format!("Backtest {id} is still loading")),
        }
        self.view = View::Dashboard;
    }

    pub fn close_selected(&mut self) {
        let Some(id) = self.dashboard.selected() else {
            return;
        };
        self.dashboard.close(id);
        self.set_status(format!("Closed backtest {id}"));
    }

    pub fn retry_selected(&mut self) {
        let Some(ticket) = self.dashboard.retry_selected() else {
            self.set_warning("Nothing to retry");
            return;
        };
        self.send(WorkerCommand::FetchBacktest { ticket });
        self.set_status(format!("Retrying backtest {}...", ticket.id()));
    }

    /// Fetch every restored tab that has no cache entry yet.
    pub fn fetch_restored_tabs(&mut self) {
        let tickets: Vec<FetchTicket> = self.dashboard.missing_fetches();
        if !tickets.is_empty() {
            let n = tickets.len();
            self.send(WorkerCommand::FetchMany { tickets });
            self.set_status(format!("Restoring {n} backtest(s)..."));
        }
    }

    /// Title for a dashboard tab: payload title when cached, else the summary.
    pub fn tab_title(&self, id: BacktestId) -> String {
        if let Some(bt) = self.dashboard.cache().ready(id) {
            return bt.title();
        }
        match self.store.find(id) {
            Some(s) => format!("{} #{id}", s.strategy_name),
            None => format!("#{id}"),
        }
    }

    // ── Worker responses ─────────────────────────────────────────────

    pub fn apply_response(&mut self, resp: WorkerResponse) {
        match resp {
            WorkerResponse::SummariesLoaded { ticket, result } => {
                let outcome = match &result {
                    Ok(summaries) => Ok(summaries.len()),
                    Err(e) => Err((ErrorCategory::of(e), e.message())),
                };
                if !self.store.finish_load(ticket, result) {
                    return;
                }
                match outcome {
                    Ok(n) => self.set_status(format!("Loaded {n} backtest summaries")),
                    Err((category, message)) => {
                        self.push_error(category, message, "loading summaries".into());
                    }
                }
                self.clamp_strategy_selection();
            }
            WorkerResponse::BacktestFetched { ticket, result } => {
                let id = ticket.id();
                match self.dashboard.complete(ticket, *result) {
                    Completion::Stored(bt) => {
                        if self.dashboard.selected() == Some(id) {
                            self.set_status(format!("Loaded {}", bt.title()));
                        }
                    }
                    Completion::Failed(e) => {
                        self.push_error(ErrorCategory::of(&e), e.message(), format!("backtest {id}"));
                    }
                    Completion::Stale => {}
                }
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.store.state() == &LoadState::Loading
    }
}

/// First row of a `visible`-row window that keeps `cursor` in view,
/// moving the window only when the cursor leaves it.
pub fn scroll_window(offset: usize, cursor: usize, visible: usize) -> usize {
    if cursor < offset {
        cursor
    } else if cursor >= offset + visible {
        cursor + 1 - visible
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backview_core::dashboard::SelectedView;
    use backview_core::domain::{Backtest, Parameters};
    use backview_core::summaries::LoadTicket;
    use std::sync::mpsc;

    fn app() -> (AppState, Receiver<WorkerCommand>, Sender<WorkerResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let app = AppState::new(cmd_tx, resp_rx, 20);
        (app, cmd_rx, resp_tx)
    }

    fn summary(id: u64, strategy: &str, params: &str) -> Summary {
        Summary {
            id: BacktestId::new(id),
            strategy_name: strategy.into(),
            parameters: Parameters(serde_json::Value::String(params.into())),
            created_at: None,
            start_date: None,
            end_date: None,
            capital: None,
            symbols: Vec::new(),
        }
    }

    fn backtest(id: u64) -> Backtest {
        serde_json::from_value(serde_json::json!({ "id": id, "strategy_name": "Pairs" })).unwrap()
    }

    fn fetched(ticket: FetchTicket, result: Result<Backtest, ApiError>) -> WorkerResponse {
        WorkerResponse::BacktestFetched {
            ticket,
            result: Box::new(result),
        }
    }

    fn sent_load(cmds: &Receiver<WorkerCommand>) -> LoadTicket {
        match cmds.try_recv().unwrap() {
            WorkerCommand::LoadSummaries { ticket } => ticket,
            other => panic!("expected LoadSummaries, got {other:?}"),
        }
    }

    fn sent_ticket(cmds: &Receiver<WorkerCommand>) -> FetchTicket {
        match cmds.try_recv().unwrap() {
            WorkerCommand::FetchBacktest { ticket } => ticket,
            other => panic!("expected FetchBacktest, got {other:?}"),
        }
    }

    #[test]
    fn view_cycle() {
        assert_eq!(View::Strategies.next(), View::Dashboard);
        assert_eq!(View::Help.next(), View::Strategies);
        assert_eq!(View::Strategies.prev(), View::Help);
        for i in 0..View::COUNT {
            assert_eq!(View::from_index(i).unwrap().index(), i);
        }
        assert!(View::from_index(3).is_none());
    }

    #[test]
    fn error_history_caps_at_50() {
        let (mut app, _cmds, _resp) = app();
        for i in 0..60 {
            app.push_error(ErrorCategory::Other, format!("error {i}"), String::new());
        }
        assert_eq!(app.error_history.len(), 50);
        assert!(app.error_history[0].message.contains("59"));
    }

    #[test]
    fn summaries_requested_once_while_loading() {
        let (mut app, cmds, _resp) = app();
        app.request_summaries();
        app.request_summaries();
        assert_eq!(cmds.try_iter().count(), 1);
        assert!(app.is_loading());
    }

    #[test]
    fn loaded_summaries_group_into_tabs() {
        let (mut app, cmds, _resp) = app();
        app.request_summaries();
        app.apply_response(WorkerResponse::SummariesLoaded {
            ticket: sent_load(&cmds),
            result: Ok(vec![
                summary(1, "A", "w=1"),
                summary(2, "B", "w=2"),
                summary(3, "A", "w=30"),
            ]),
        });
        assert_eq!(app.selected_group().unwrap().name, "A");
        assert_eq!(app.visible_summaries().len(), 2);
        app.next_strategy();
        assert_eq!(app.selected_group().unwrap().name, "B");
        app.next_strategy();
        assert_eq!(app.selected_group().unwrap().name, "A");
    }

    #[test]
    fn failed_summaries_are_recorded() {
        let (mut app, cmds, _resp) = app();
        app.request_summaries();
        app.apply_response(WorkerResponse::SummariesLoaded {
            ticket: sent_load(&cmds),
            result: Err(ApiError::Network("refused".into())),
        });
        assert!(matches!(app.store.state(), LoadState::Failed(_)));
        assert_eq!(app.error_history[0].category, ErrorCategory::Network);
    }

    #[test]
    fn superseded_listing_is_dropped_after_reload() {
        let (mut app, cmds, _resp) = app();
        app.request_summaries();
        let first = sent_load(&cmds);
        app.reload_summaries();
        let second = sent_load(&cmds);
        app.apply_response(WorkerResponse::SummariesLoaded {
            ticket: first,
            result: Err(ApiError::Network("late".into())),
        });
        assert!(app.is_loading());
        assert!(app.error_history.is_empty());
        app.apply_response(WorkerResponse::SummariesLoaded {
            ticket: second,
            result: Ok(vec![summary(9, "Fresh", "")]),
        });
        assert_eq!(app.selected_group().unwrap().name, "Fresh");
    }

    #[test]
    fn filter_narrows_rows() {
        let (mut app, _cmds, _resp) = app();
        app.store = SummariesStore::with_cached(vec![
            summary(11, "A", "window=10"),
            summary(12, "A", "window=50"),
        ]);
        app.set_filter("50".into());
        let rows = app.visible_summaries();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, BacktestId::new(12));
    }

    #[test]
    fn opening_twice_fetches_once() {
        let (mut app, cmds, _resp) = app();
        app.open_backtest(BacktestId::new(4));
        let ticket = sent_ticket(&cmds);
        app.open_backtest(BacktestId::new(4));
        assert!(cmds.try_recv().is_err(), "in-flight fetch is not repeated");
        assert_eq!(app.view, View::Dashboard);

        app.apply_response(fetched(ticket, Ok(backtest(4))));
        app.open_backtest(BacktestId::new(4));
        assert!(cmds.try_recv().is_err(), "cached payload is not refetched");
        assert_eq!(app.dashboard.tabs().len(), 1);
    }

    #[test]
    fn result_for_closed_tab_is_dropped() {
        let (mut app, cmds, _resp) = app();
        app.open_backtest(BacktestId::new(8));
        let ticket = sent_ticket(&cmds);
        app.close_selected();
        app.apply_response(fetched(ticket, Ok(backtest(8))));
        assert!(app.dashboard.cache().is_empty());
        assert_eq!(app.dashboard.view(), SelectedView::Empty);
    }

    #[test]
    fn failed_fetch_can_be_retried() {
        let (mut app, cmds, _resp) = app();
        app.open_backtest(BacktestId::new(9));
        let ticket = sent_ticket(&cmds);
        app.apply_response(fetched(
            ticket,
            Err(ApiError::Http { status: 404, detail: "Not found.".into() }),
        ));
        assert_eq!(app.error_history[0].category, ErrorCategory::Http);
        app.retry_selected();
        let retry = sent_ticket(&cmds);
        assert_eq!(retry.id(), BacktestId::new(9));
        assert_ne!(retry, ticket);
    }

    #[test]
    fn tab_title_prefers_payload_then_summary() {
        let (mut app, cmds, _resp) = app();
        app.store = SummariesStore::with_cached(vec![summary(5, "Momentum", "")]);
        app.open_backtest(BacktestId::new(5));
        assert_eq!(app.tab_title(BacktestId::new(5)), "Momentum #5");
        app.apply_response(fetched(sent_ticket(&cmds), Ok(backtest(5))));
        assert_eq!(app.tab_title(BacktestId::new(5)), "Pairs #5");
        assert_eq!(app.tab_title(BacktestId::new(77)), "#77");
    }

    fn many_rows(app: &mut AppState, n: u64) {
        let rows = (1..=n).map(|id| summary(id, "A", "w=1")).collect();
        app.store = SummariesStore::with_cached(rows);
    }

    #[test]
    fn scroll_window_moves_only_when_cursor_leaves_it() {
        assert_eq!(scroll_window(0, 3, 10), 0);
        assert_eq!(scroll_window(0, 12, 10), 3);
        assert_eq!(scroll_window(5, 2, 10), 2);
        assert_eq!(scroll_window(4, 8, 5), 4);
    }

    #[test]
    fn scroll_offset_tracks_cursor_and_holds_on_reversal() {
        let (mut app, _cmds, _resp) = app();
        many_rows(&mut app, 30);
        app.set_viewport(5);

        for _ in 0..7 {
            app.cursor_down();
        }
        assert_eq!(app.strategies.cursor, 7);
        assert_eq!(app.strategies.scroll_offset, 3, "cursor sits on the last visible row");

        // Moving back up inside the window keeps the window where it is.
        app.cursor_up();
        app.cursor_up();
        assert_eq!(app.strategies.cursor, 5);
        assert_eq!(app.strategies.scroll_offset, 3);

        for _ in 0..3 {
            app.cursor_up();
        }
        assert_eq!(app.strategies.scroll_offset, 2);
    }

    #[test]
    fn shrinking_viewport_pulls_window_to_cursor() {
        let (mut app, _cmds, _resp) = app();
        many_rows(&mut app, 30);
        app.set_viewport(20);
        for _ in 0..10 {
            app.cursor_down();
        }
        assert_eq!(app.strategies.scroll_offset, 0);
        app.set_viewport(4);
        assert_eq!(app.strategies.scroll_offset, 7);
    }
}
