//! Keyboard input dispatch — overlays → global keys → view-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use backview_core::table::TableTab;

use crate::app::{AppState, Overlay, View};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match &app.overlay {
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::Search => {
            handle_search_overlay(app, key);
            return;
        }
        Overlay::Detail(_) => {
            handle_detail_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys (always available).
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
            return;
        }
        KeyCode::Char('1') => { app.view = View::Strategies; return; }
        KeyCode::Char('2') => { app.view = View::Dashboard; return; }
        KeyCode::Char('3') | KeyCode::Char('?') => { app.view = View::Help; return; }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.view = app.view.prev();
            } else {
                app.view = app.view.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.view = app.view.prev();
            return;
        }
        KeyCode::Char('e') => {
            app.overlay = Overlay::ErrorHistory;
            app.error_scroll = 0;
            return;
        }
        _ => {}
    }

    // 3. View-specific keys.
    match app.view {
        View::Strategies => handle_strategies_key(app, key),
        View::Dashboard => handle_dashboard_key(app, key),
        View::Help => {} // display only
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_search_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
            app.search_input.clear();
        }
        KeyCode::Enter => {
            let filter = std::mem::take(&mut app.search_input);
            let filter = filter.trim().to_string();
            if filter.is_empty() {
                app.set_status("Filter cleared");
            } else {
                app.set_status(format!("Filter: {filter}"));
            }
            app.set_filter(filter);
            app.overlay = Overlay::None;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
        }
        _ => {}
    }
}

fn handle_detail_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('i') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Enter => {
            if let Overlay::Detail(id) = app.overlay {
                app.overlay = Overlay::None;
                app.open_backtest(id);
            }
        }
        _ => {}
    }
}

fn handle_strategies_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
        KeyCode::Char('l') | KeyCode::Right => app.next_strategy(),
        KeyCode::Char('h') | KeyCode::Left => app.prev_strategy(),
        KeyCode::Enter => {
            if let Some(id) = app.cursor_summary().map(|s| s.id) {
                app.open_backtest(id);
            }
        }
        KeyCode::Char('i') => {
            if let Some(id) = app.cursor_summary().map(|s| s.id) {
                app.overlay = Overlay::Detail(id);
            }
        }
        KeyCode::Char('r') => app.reload_summaries(),
        KeyCode::Char('/') => {
            app.search_input = app.strategies.filter.clone();
            app.overlay = Overlay::Search;
        }
        KeyCode::Esc => {
            if !app.strategies.filter.is_empty() {
                app.set_filter(String::new());
                app.set_status("Filter cleared");
            }
        }
        _ => {}
    }
}

fn handle_dashboard_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char(']') | KeyCode::Char('l') | KeyCode::Right => app.dashboard.select_next(),
        KeyCode::Char('[') | KeyCode::Char('h') | KeyCode::Left => app.dashboard.select_prev(),
        KeyCode::Char('x') => app.close_selected(),
        KeyCode::Char('c') => app.dashboard.cycle_chart(),
        KeyCode::Char('o') => app.dashboard.set_table(TableTab::Overview),
        KeyCode::Char('t') => app.dashboard.set_table(TableTab::Trades),
        KeyCode::Char('s') => app.dashboard.set_table(TableTab::Signals),
        KeyCode::Char('n') | KeyCode::PageDown => {
            app.dashboard.next_page();
        }
        KeyCode::Char('p') | KeyCode::PageUp => {
            app.dashboard.prev_page();
        }
        KeyCode::Char('R') => app.retry_selected(),
        _ => {}
    }
}
