//! App state persistence — maps AppState to and from the session file.
//!
//! The file format and its load/save live in `backview_core::session` so
//! the CLI shares the same token and tab list.

use backview_core::session::SessionState;
use backview_core::summaries::SummariesStore;

use crate::app::AppState;

/// Extract persisted state from AppState.
pub fn extract(app: &AppState) -> SessionState {
    let summaries = app.store.summaries();
    SessionState {
        token: app.token.clone(),
        current_backtest: app.dashboard.selected(),
        opened: app.dashboard.tabs().ids().to_vec(),
        selected_strategy: app.selected_group().map(|g| g.name.clone()),
        cached_summaries: (!summaries.is_empty()).then(|| summaries.to_vec()),
    }
}

/// Apply persisted state to AppState. Restored tabs still need fetching
/// via [`AppState::fetch_restored_tabs`].
pub fn apply(app: &mut AppState, state: SessionState) {
    app.token = state.token;
    if let Some(cached) = state.cached_summaries {
        app.store = SummariesStore::with_cached(cached);
    }
    app.strategies.pending_strategy = state.selected_strategy;
    if let Some(name) = app.strategies.pending_strategy.as_deref() {
        if let Some(idx) = app.store.groups().position(name) {
            app.strategies.tab = idx;
            app.strategies.pending_strategy = None;
        }
    }
    app.dashboard.restore(&state.opened, state.current_backtest);
}
