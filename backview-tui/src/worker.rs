//! Background worker thread — all network calls run here.
//!
//! Communication with the TUI main thread is via `mpsc` channels. The
//! worker never touches the cache: it performs the fetch named by a
//! ticket and hands the result back, and the main thread decides whether
//! the result is still wanted. Bulk fetches fan out over a private
//! rayon::ThreadPool (not the global pool).

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rayon::prelude::*;

use backview_core::api::{ApiError, ApiResult, BacktestApi};
use backview_core::cache::FetchTicket;
use backview_core::domain::{Backtest, Summary};
use backview_core::summaries::LoadTicket;

const FETCH_THREADS: usize = 4;

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    LoadSummaries { ticket: LoadTicket },
    FetchBacktest { ticket: FetchTicket },
    /// Fetch several backtests concurrently (session restore).
    FetchMany { tickets: Vec<FetchTicket> },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    SummariesLoaded {
        ticket: LoadTicket,
        result: ApiResult<Vec<Summary>>,
    },
    BacktestFetched {
        ticket: FetchTicket,
        result: Box<ApiResult<Backtest>>,
    },
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    api: Arc<dyn BacktestApi>,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("backview-worker".into())
        .spawn(move || {
            worker_loop(api.as_ref(), rx, tx, cancel);
        })
}

fn worker_loop(
    api: &dyn BacktestApi,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) {
    // Create a private rayon thread pool (not the global one).
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(FETCH_THREADS)
        .thread_name(|i| format!("backview-fetch-{i}"))
        .build()
        .map_err(|e| tracing::warn!(error = %e, "fetch pool unavailable; fetching sequentially"))
        .ok();

    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => handle_command(api, cmd, &tx, &cancel, pool.as_ref()),
        }
    }
    tracing::debug!("worker stopped");
}

fn handle_command(
    api: &dyn BacktestApi,
    cmd: WorkerCommand,
    tx: &Sender<WorkerResponse>,
    cancel: &AtomicBool,
    pool: Option<&rayon::ThreadPool>,
) {
    match cmd {
        WorkerCommand::LoadSummaries { ticket } => {
            let result = api.list_summaries();
            let _ = tx.send(WorkerResponse::SummariesLoaded { ticket, result });
        }
        WorkerCommand::FetchBacktest { ticket } => {
            let _ = tx.send(fetch_one(api, ticket));
        }
        WorkerCommand::FetchMany { tickets } => match pool {
            Some(pool) => pool.install(|| {
                tickets.par_iter().for_each_with(tx.clone(), |tx, &ticket| {
                    if !cancel.load(Ordering::Relaxed) {
                        let _ = tx.send(fetch_one(api, ticket));
                    }
                });
            }),
            None => {
                for ticket in tickets {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    let _ = tx.send(fetch_one(api, ticket));
                }
            }
        },
        WorkerCommand::Shutdown => {} // handled in loop
    }
}

fn fetch_one(api: &dyn BacktestApi, ticket: FetchTicket) -> WorkerResponse {
    let id = ticket.id();
    tracing::debug!(%id, "fetching backtest");
    let result = api.get_backtest(id);
    if let Err(ApiError::Decode(msg)) = &result {
        tracing::warn!(%id, error = %msg, "backtest payload did not decode");
    }
    WorkerResponse::BacktestFetched {
        ticket,
        result: Box::new(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    use backview_core::cache::{BacktestCache, FetchStart};
    use backview_core::domain::BacktestId;

    #[derive(Default)]
    struct StubApi {
        gets: AtomicUsize,
    }

    impl BacktestApi for StubApi {
        fn list_summaries(&self) -> ApiResult<Vec<Summary>> {
            Ok(Vec::new())
        }

        fn get_backtest(&self, id: BacktestId) -> ApiResult<Backtest> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if id.get() == 13 {
                return Err(ApiError::Network("connection refused".into()));
            }
            Ok(serde_json::from_value(serde_json::json!({ "id": id.get() })).unwrap())
        }

        fn login(&self, _: &str, _: &str) -> ApiResult<String> {
            Err(ApiError::MissingToken)
        }
    }

    fn spawn(api: Arc<StubApi>) -> (Sender<WorkerCommand>, Receiver<WorkerResponse>, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = spawn_worker(api, cmd_rx, resp_tx, cancel).unwrap();
        (cmd_tx, resp_rx, handle)
    }

    fn ticket(cache: &mut BacktestCache, raw: u64) -> FetchTicket {
        match cache.begin_fetch(BacktestId::new(raw)) {
            FetchStart::Started(t) => t,
            other => panic!("expected Started, got {other:?}"),
        }
    }

    #[test]
    fn worker_shutdown() {
        let (cmd_tx, _resp_rx, handle) = spawn(Arc::new(StubApi::default()));
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().expect("worker should join cleanly");
    }

    #[test]
    fn worker_uses_private_pool() {
        let global_threads = rayon::current_num_threads();
        let (cmd_tx, _resp_rx, handle) = spawn(Arc::new(StubApi::default()));
        assert_eq!(rayon::current_num_threads(), global_threads);
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn fetch_returns_ticket_with_result() {
        let api = Arc::new(StubApi::default());
        let (cmd_tx, resp_rx, handle) = spawn(api.clone());
        let mut cache = BacktestCache::new();
        let t = ticket(&mut cache, 3);

        cmd_tx.send(WorkerCommand::FetchBacktest { ticket: t }).unwrap();
        match resp_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            WorkerResponse::BacktestFetched { ticket, result } => {
                assert_eq!(ticket, t);
                assert_eq!(result.unwrap().id, BacktestId::new(3));
            }
            other => panic!("unexpected response {other:?}"),
        }
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn fetch_many_answers_every_ticket() {
        let api = Arc::new(StubApi::default());
        let (cmd_tx, resp_rx, handle) = spawn(api.clone());
        let mut cache = BacktestCache::new();
        let tickets: Vec<FetchTicket> = [1, 2, 13, 4].iter().map(|&r| ticket(&mut cache, r)).collect();

        cmd_tx
            .send(WorkerCommand::FetchMany { tickets: tickets.clone() })
            .unwrap();
        let mut failed = 0;
        for _ in 0..tickets.len() {
            if let WorkerResponse::BacktestFetched { result, .. } =
                resp_rx.recv_timeout(Duration::from_secs(5)).unwrap()
            {
                if result.is_err() {
                    failed += 1;
                }
            }
        }
        assert_eq!(failed, 1, "one bad id does not sink the batch");
        assert_eq!(api.gets.load(Ordering::SeqCst), 4);
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
