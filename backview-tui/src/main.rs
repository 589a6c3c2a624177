//! Backview TUI — browse stored backtests by strategy and inspect them.
//!
//! Views:
//! 1. Strategies — one tab per strategy, summary table per tab
//! 2. Dashboard — open backtests with header, charts and tables
//! 3. Help — keyboard shortcuts

mod app;
mod input;
mod panels;
mod persistence;
mod theme;
mod ui;
mod worker;

use std::fs::{self, OpenOptions};
use std::io::{self, stdout};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use backview_core::api::{BacktestApi, HttpClient};
use backview_core::config::AppConfig;
use backview_core::session;

use crate::app::AppState;
use crate::worker::WorkerCommand;

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let config = AppConfig::load(None).context("loading configuration")?;
    init_logging(&config.log_path())?;
    tracing::info!(base_url = %config.api.base_url, "starting backview-tui");

    // Session: token, open tabs, cached listing
    let session_path = config.session_path();
    let persisted = session::load(&session_path);

    let api: Arc<dyn BacktestApi> = Arc::new(
        HttpClient::new(&config.api, persisted.token.clone())
            .context("building HTTP client")?,
    );

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));

    let worker_handle = worker::spawn_worker(api, cmd_rx, resp_tx, cancel.clone())
        .context("spawning background worker")?;

    let mut app = AppState::new(cmd_tx.clone(), resp_rx, config.page_size);
    persistence::apply(&mut app, persisted);
    app.request_summaries();
    app.fetch_restored_tabs();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Stop pending bulk fetches, then persist.
    cancel.store(true, Ordering::Relaxed);
    let state = persistence::extract(&app);
    if let Err(e) = session::save(&session_path, &state) {
        tracing::warn!(error = %e, "failed to save session");
    }

    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    if worker_handle.join().is_err() {
        tracing::error!("worker thread panicked");
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        app.set_viewport(ui::strategies_panel::table_rows(terminal.size()?.height));
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            app.apply_response(resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}
