//! Backtest cache — lazy, memoizing store of full backtest payloads.
//!
//! Each id moves through `Pending → Ready | Failed`. Fetches are split
//! into [`BacktestCache::begin_fetch`] and [`BacktestCache::complete`] so a
//! worker thread can perform the network call while the cache stays owned
//! by the UI thread. Every fetch carries a [`FetchTicket`]; removing an id
//! invalidates its outstanding ticket, and a completion presented with an
//! invalidated ticket is discarded instead of resurrecting the entry.
//!
//! Concurrent requests for an id that is already `Pending` coalesce onto the
//! in-flight fetch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{ApiError, ApiResult, BacktestApi};
use crate::domain::{Backtest, BacktestId};

/// Handle identifying one fetch attempt for one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    id: BacktestId,
    generation: u64,
}

impl FetchTicket {
    pub fn id(&self) -> BacktestId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryState {
    Pending,
    Ready(Arc<Backtest>),
    Failed(String),
}

#[derive(Debug, Clone)]
struct Entry {
    state: EntryState,
    generation: u64,
}

/// Outcome of asking the cache for an id.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStart {
    /// Already cached; no network call needed.
    Cached(Arc<Backtest>),
    /// The caller must fetch and hand the result to `complete`.
    Started(FetchTicket),
    /// A fetch for this id is already running.
    InFlight,
}

/// Outcome of presenting a fetch result to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Stored(Arc<Backtest>),
    Failed(ApiError),
    /// The id was removed (or refetched) after this fetch began.
    Stale,
}

#[derive(Debug, Default)]
pub struct BacktestCache {
    entries: HashMap<BacktestId, Entry>,
    next_generation: u64,
    revision: u64,
}

impl BacktestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic change counter, bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn state(&self, id: BacktestId) -> Option<&EntryState> {
        self.entries.get(&id).map(|e| &e.state)
    }

    pub fn ready(&self, id: BacktestId) -> Option<Arc<Backtest>> {
        match self.state(id) {
            Some(EntryState::Ready(bt)) => Some(Arc::clone(bt)),
            _ => None,
        }
    }

    pub fn contains(&self, id: BacktestId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<BacktestId> {
        let mut ids: Vec<BacktestId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `id`, registering a new fetch when it is absent or failed.
    pub fn begin_fetch(&mut self, id: BacktestId) -> FetchStart {
        if let Some(entry) = self.entries.get(&id) {
            match &entry.state {
                EntryState::Ready(bt) => {
                    tracing::trace!(%id, "cache hit");
                    return FetchStart::Cached(Arc::clone(bt));
                }
                EntryState::Pending => {
                    tracing::debug!(%id, "fetch already in flight");
                    return FetchStart::InFlight;
                }
                EntryState::Failed(_) => {}
            }
        }

        self.next_generation += 1;
        let ticket = FetchTicket {
            id,
            generation: self.next_generation,
        };
        self.entries.insert(
            id,
            Entry {
                state: EntryState::Pending,
                generation: ticket.generation,
            },
        );
        self.revision += 1;
        tracing::debug!(%id, "cache miss, fetch started");
        FetchStart::Started(ticket)
    }

    /// Record the result of the fetch identified by `ticket`.
    pub fn complete(&mut self, ticket: FetchTicket, result: ApiResult<Backtest>) -> Completion {
        let entry = match self.entries.get_mut(&ticket.id) {
            Some(e) if e.generation == ticket.generation && e.state == EntryState::Pending => e,
            _ => {
                tracing::debug!(id = %ticket.id, "discarding stale fetch result");
                return Completion::Stale;
            }
        };

        self.revision += 1;
        match result {
            Ok(backtest) => {
                if backtest.id != ticket.id {
                    tracing::warn!(
                        requested = %ticket.id,
                        received = %backtest.id,
                        "backend returned a different id; keeping requested key"
                    );
                }
                let bt = Arc::new(backtest);
                entry.state = EntryState::Ready(Arc::clone(&bt));
                tracing::debug!(id = %ticket.id, "backtest cached");
                Completion::Stored(bt)
            }
            Err(e) => {
                tracing::error!(id = %ticket.id, error = %e, "error fetching backtest");
                entry.state = EntryState::Failed(e.message());
                Completion::Failed(e)
            }
        }
    }

    /// Fetch-or-return on the calling thread.
    ///
    /// Returns `None` on failure (recorded as `Failed`, retried on the next
    /// call) or when a fetch for `id` is already in flight elsewhere.
    pub fn get(&mut self, id: BacktestId, api: &dyn BacktestApi) -> Option<Arc<Backtest>> {
        match self.begin_fetch(id) {
            FetchStart::Cached(bt) => Some(bt),
            FetchStart::InFlight => None,
            FetchStart::Started(ticket) => match self.complete(ticket, api.get_backtest(id)) {
                Completion::Stored(bt) => Some(bt),
                Completion::Failed(_) | Completion::Stale => None,
            },
        }
    }

    /// Evict `id`. Any fetch still running for it becomes stale.
    pub fn remove(&mut self, id: BacktestId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            self.revision += 1;
            tracing::debug!(%id, "backtest evicted");
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.revision += 1;
        }
    }
}
