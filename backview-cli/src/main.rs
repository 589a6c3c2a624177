//! Backview CLI — sign in, list, inspect and export stored backtests.
//!
//! Commands:
//! - `login` / `logout` — manage the token kept in the session file
//! - `list` — summaries grouped by strategy
//! - `show` — one backtest's overview, trades or signals, a page at a time
//! - `export` — trades, signals or the equity curve as CSV
//! - `config` — print the effective configuration

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use backview_core::api::{BacktestApi, HttpClient};
use backview_core::config::AppConfig;
use backview_core::dashboard::{Dashboard, SelectedView};
use backview_core::domain::{Backtest, BacktestId, Summary};
use backview_core::session;
use backview_core::summaries::{LoadState, StrategyGroup, StrategyGroups, SummariesStore};
use backview_core::table::{overview_grid, signal_rows, Pager, SignalRow, TableTab};

#[derive(Parser)]
#[command(name = "backview", about = "Backview CLI — browse stored backtest results")]
struct Cli {
    /// Path to a TOML config file (defaults to $BACKVIEW_CONFIG, then the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange credentials for a token and store it in the session file.
    Login {
        #[arg(long)]
        username: String,

        /// Password; read from $BACKVIEW_PASSWORD when omitted.
        #[arg(long, env = "BACKVIEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// List backtest summaries grouped by strategy.
    List {
        /// Only show this strategy.
        #[arg(long)]
        strategy: Option<String>,

        /// Print a JSON envelope instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show one backtest.
    Show {
        id: BacktestId,

        /// Table to print: overview, trades or signals.
        #[arg(long, default_value = "overview", value_parser = parse_table)]
        table: TableTab,

        /// 1-based page for trades and signals.
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Export one backtest's rows as CSV.
    Export {
        id: BacktestId,

        #[arg(long, value_enum)]
        what: ExportKind,

        /// Destination CSV file.
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportKind {
    Trades,
    Signals,
    Equity,
}

fn parse_table(raw: &str) -> Result<TableTab, String> {
    TableTab::parse(raw).ok_or_else(|| format!("unknown table '{raw}'; expected overview, trades or signals"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Login { username, password } => run_login(&config, &username, &password),
        Commands::Logout => run_logout(&config),
        Commands::List { strategy, json } => run_list(&config, strategy.as_deref(), json),
        Commands::Show {
            id,
            table,
            page,
            json,
        } => run_show(&config, id, table, page, json),
        Commands::Export { id, what, out } => run_export(&config, id, what, &out),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Client carrying the stored token, if any.
fn client(config: &AppConfig) -> Result<HttpClient> {
    let token = session::load(&config.session_path()).token;
    HttpClient::new(&config.api, token).context("building HTTP client")
}

fn run_login(config: &AppConfig, username: &str, password: &str) -> Result<()> {
    let api = HttpClient::new(&config.api, None).context("building HTTP client")?;
    let token = api.login(username, password).context("login failed")?;

    let path = config.session_path();
    let mut state = session::load(&path);
    state.token = Some(token);
    session::save(&path, &state).context("saving session")?;

    tracing::info!(%username, "stored session token");
    println!("Logged in as {username}.");
    Ok(())
}

fn run_logout(config: &AppConfig) -> Result<()> {
    let path = config.session_path();
    let mut state = session::load(&path);
    if state.token.is_none() {
        println!("Not logged in.");
        return Ok(());
    }
    state.clear_token();
    session::save(&path, &state).context("saving session")?;
    println!("Logged out.");
    Ok(())
}

fn run_list(config: &AppConfig, strategy: Option<&str>, json: bool) -> Result<()> {
    let api = client(config)?;
    let mut store = SummariesStore::new();
    if let LoadState::Failed(msg) = store.load_with(&api) {
        let msg = msg.clone();
        if json {
            return print_json(&failure(&msg));
        }
        bail!("loading summaries: {msg}");
    }

    let selected = match select_groups(store.groups(), strategy) {
        Ok(groups) => groups,
        Err(msg) if json => return print_json(&failure(&msg)),
        Err(msg) => bail!("{msg}"),
    };

    if json {
        return print_json(&json!({ "ok": true, "data": groups_json(&selected)? }));
    }

    if selected.is_empty() {
        println!("No backtests stored.");
        return Ok(());
    }
    for group in selected {
        println!();
        println!("=== {} ({}) ===", group.name, group.summaries.len());
        println!("{:<6} {:<25} {:>12}  {}", "ID", "Period", "Capital", "Parameters");
        println!("{}", "-".repeat(70));
        for s in &group.summaries {
            println!("{}", summary_line(s));
        }
    }
    println!();
    Ok(())
}

/// Every group, or only the one `--strategy` names.
fn select_groups<'a>(groups: &'a StrategyGroups, strategy: Option<&str>) -> Result<Vec<&'a StrategyGroup>, String> {
    let Some(name) = strategy else {
        return Ok(groups.iter().collect());
    };
    groups
        .position(name)
        .and_then(|i| groups.group_at(i))
        .map(|g| vec![g])
        .ok_or_else(|| format!("no backtests for strategy '{name}'"))
}

fn groups_json(groups: &[&StrategyGroup]) -> serde_json::Result<Value> {
    let data: serde_json::Map<String, Value> = groups
        .iter()
        .map(|g| Ok((g.name.clone(), serde_json::to_value(&g.summaries)?)))
        .collect::<serde_json::Result<_>>()?;
    Ok(Value::Object(data))
}

fn summary_line(s: &Summary) -> String {
    let capital = s
        .capital
        .map(|c| format!("{c:.0}"))
        .unwrap_or_else(|| "-".into());
    format!(
        "{:<6} {:<25} {:>12}  {}",
        s.id.to_string(),
        s.period(),
        capital,
        s.parameters.display()
    )
}

/// Fetch one backtest through the dashboard so load failures read the same as in the TUI.
fn fetch(config: &AppConfig, id: BacktestId) -> Result<(Dashboard, std::sync::Arc<Backtest>), String> {
    let api = client(config).map_err(|e| format!("{e:#}"))?;
    let mut dashboard = Dashboard::new(config.page_size);
    match dashboard.open_blocking(id, &api) {
        SelectedView::Ready(bt) => Ok((dashboard, bt)),
        SelectedView::Failed(_, msg) => Err(msg),
        SelectedView::Loading(_) | SelectedView::Empty => Err(format!("backtest {id} did not load")),
    }
}

fn run_show(config: &AppConfig, id: BacktestId, table: TableTab, page: usize, json: bool) -> Result<()> {
    let (mut dashboard, bt) = match fetch(config, id) {
        Ok(loaded) => loaded,
        Err(msg) if json => return print_json(&failure(&msg)),
        Err(msg) => bail!("failed to load backtest {id}: {msg}"),
    };

    dashboard.set_table(table);
    dashboard.go_to_page(page);
    let pager = dashboard
        .pager()
        .copied()
        .unwrap_or_else(|| Pager::new(config.page_size, 0));
    let signals = signal_rows(&bt.signals);

    if json {
        let data = match table {
            TableTab::Overview => json!({
                "title": bt.title(),
                "parameters": bt.parameters,
                "summary_stats": bt.summary_stats,
            }),
            TableTab::Trades => json!({
                "page": pager.page(),
                "total_pages": pager.total_pages(),
                "rows": pager.slice(&bt.trades),
            }),
            TableTab::Signals => json!({
                "page": pager.page(),
                "total_pages": pager.total_pages(),
                "rows": pager.slice(&signals).iter().map(signal_json).collect::<Vec<_>>(),
            }),
        };
        return print_json(&json!({ "ok": true, "data": data }));
    }

    println!();
    println!("=== {} ===", bt.title());
    let params = bt.parameters.display();
    if !params.is_empty() {
        println!("Parameters: {params}");
    }
    if !bt.symbols().is_empty() {
        println!("Symbols:    {}", bt.symbols().join(", "));
    }
    println!();

    match table {
        TableTab::Overview => print_overview(&bt),
        TableTab::Trades => print_trades(&bt, &pager),
        TableTab::Signals => print_signals(&signals, &pager),
    }
    Ok(())
}

fn print_overview(bt: &Backtest) {
    println!("--- Overview ---");
    for row in overview_grid(&bt.summary_stats) {
        let right = row
            .right
            .map(|c| format!("{:<24} {:>14}", c.label, c.value))
            .unwrap_or_default();
        println!("{:<24} {:>14}    {}", row.left.label, row.left.value, right);
    }
    println!();
}

fn print_trades(bt: &Backtest, pager: &Pager) {
    println!("--- Trades ({}) page {}/{} ---", pager.total(), pager.page(), pager.last_page());
    println!(
        "{:<20} {:<8} {:<6} {:<10} {:<6} {:>10} {:>12} {:>12}",
        "Time", "Trade", "Leg", "Symbol", "Dir", "Qty", "Price", "Cost"
    );
    println!("{}", "-".repeat(92));
    for t in pager.slice(&bt.trades) {
        println!(
            "{:<20} {:<8} {:<6} {:<10} {:<6} {:>10.2} {:>12.4} {:>12.2}",
            t.timestamp.format("%Y-%m-%d %H:%M"),
            t.trade_id,
            t.leg_id,
            t.symbol,
            t.direction.as_str(),
            t.quantity,
            t.price,
            t.cost
        );
    }
    println!();
}

fn print_signals(rows: &[SignalRow], pager: &Pager) {
    println!("--- Signals ({}) page {}/{} ---", pager.total(), pager.page(), pager.last_page());
    println!("{:<20} {:<10} {:<6} {:<6} {:>10}", "Time", "Ticker", "Dir", "Leg", "Alloc %");
    println!("{}", "-".repeat(56));
    for r in pager.slice(rows) {
        println!(
            "{:<20} {:<10} {:<6} {:<6} {:>9.2}%",
            r.timestamp.format("%Y-%m-%d %H:%M"),
            r.ticker,
            r.direction.as_str(),
            r.leg_id,
            r.allocation_percent * 100.0
        );
    }
    println!();
}

fn signal_json(r: &SignalRow) -> Value {
    json!({
        "timestamp": r.timestamp.to_rfc3339(),
        "ticker": r.ticker,
        "direction": r.direction.as_str(),
        "leg_id": r.leg_id,
        "allocation_percent": r.allocation_percent,
    })
}

fn run_export(config: &AppConfig, id: BacktestId, what: ExportKind, out: &Path) -> Result<()> {
    let (_dashboard, bt) = fetch(config, id).map_err(|msg| anyhow::anyhow!("failed to load backtest {id}: {msg}"))?;
    let file = std::fs::File::create(out)
        .with_context(|| format!("creating {}", out.display()))?;
    let rows = write_csv(file, &bt, what).with_context(|| format!("writing {}", out.display()))?;
    println!("Wrote {rows} row(s) to {}", out.display());
    Ok(())
}

/// Write the chosen rows as CSV; returns the number of data rows.
fn write_csv<W: Write>(dest: W, bt: &Backtest, what: ExportKind) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(dest);
    let count = match what {
        ExportKind::Trades => {
            wtr.write_record(["timestamp", "trade_id", "leg_id", "symbol", "direction", "quantity", "price", "cost"])?;
            for t in &bt.trades {
                wtr.write_record([
                    t.timestamp.to_rfc3339(),
                    t.trade_id.clone(),
                    t.leg_id.clone(),
                    t.symbol.clone(),
                    t.direction.as_str().to_string(),
                    t.quantity.to_string(),
                    t.price.to_string(),
                    t.cost.to_string(),
                ])?;
            }
            bt.trades.len()
        }
        ExportKind::Signals => {
            let rows = signal_rows(&bt.signals);
            wtr.write_record(["timestamp", "ticker", "direction", "leg_id", "allocation_percent"])?;
            for r in &rows {
                wtr.write_record([
                    r.timestamp.to_rfc3339(),
                    r.ticker.clone(),
                    r.direction.as_str().to_string(),
                    r.leg_id.clone(),
                    r.allocation_percent.to_string(),
                ])?;
            }
            rows.len()
        }
        ExportKind::Equity => {
            wtr.write_record(["timestamp", "equity_value", "percent_return", "percent_drawdown"])?;
            for p in &bt.equity_data {
                wtr.write_record([
                    p.timestamp.to_rfc3339(),
                    p.equity_value.to_string(),
                    p.percent_return.to_string(),
                    p.percent_drawdown.to_string(),
                ])?;
            }
            bt.equity_data.len()
        }
    };
    wtr.flush()?;
    Ok(count)
}

fn failure(msg: &str) -> Value {
    json!({ "ok": false, "error": msg })
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
