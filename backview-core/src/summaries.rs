//! Summaries store — fetch all summaries once, group them by strategy name.
//!
//! State machine: `Idle → Loading → Ready`, or `Loading → Failed`.
//! There is no retry policy; `reload()` returns to `Idle` so the caller can
//! start another load. Each load hands out a [`LoadTicket`]; a result that
//! arrives with an older ticket is dropped.

use std::collections::HashMap;

use crate::api::{ApiResult, BacktestApi};
use crate::domain::{BacktestId, Summary};

/// One strategy and its backtests in listing order.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyGroup {
    pub name: String,
    pub summaries: Vec<Summary>,
}

/// Summaries grouped by `strategy_name`, groups in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyGroups {
    groups: Vec<StrategyGroup>,
    index: HashMap<String, usize>,
}

impl StrategyGroups {
    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&[Summary]> {
        self.index
            .get(name)
            .map(|&i| self.groups[i].summaries.as_slice())
    }

    pub fn group_at(&self, idx: usize) -> Option<&StrategyGroup> {
        self.groups.get(idx)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Group summaries by strategy name.
///
/// Pure and order-preserving: groups appear in order of their first member,
/// and members keep their relative input order.
pub fn group_by_strategy(summaries: &[Summary]) -> StrategyGroups {
    let mut out = StrategyGroups::default();
    for s in summaries {
        let idx = match out.index.get(&s.strategy_name) {
            Some(&i) => i,
            None => {
                out.groups.push(StrategyGroup {
                    name: s.strategy_name.clone(),
                    summaries: Vec::new(),
                });
                out.index.insert(s.strategy_name.clone(), out.groups.len() - 1);
                out.groups.len() - 1
            }
        };
        out.groups[idx].summaries.push(s.clone());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Identifies one `begin_load`. Only the latest ticket may finish a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone)]
pub struct SummariesStore {
    state: LoadState,
    summaries: Vec<Summary>,
    groups: StrategyGroups,
    generation: u64,
}

impl Default for SummariesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SummariesStore {
    pub fn new() -> Self {
        Self {
            state: LoadState::Idle,
            summaries: Vec::new(),
            groups: StrategyGroups::default(),
            generation: 0,
        }
    }

    /// Seed the store from a previously persisted listing.
    pub fn with_cached(summaries: Vec<Summary>) -> Self {
        let mut store = Self::new();
        store.store(summaries);
        store
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn summaries(&self) -> &[Summary] {
        &self.summaries
    }

    pub fn groups(&self) -> &StrategyGroups {
        &self.groups
    }

    pub fn find(&self, id: BacktestId) -> Option<&Summary> {
        self.summaries.iter().find(|s| s.id == id)
    }

    /// Enter `Loading` if a fetch is needed. Returns a ticket when the caller
    /// must issue `list_summaries`.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if !self.summaries.is_empty() || self.state == LoadState::Loading {
            return None;
        }
        self.generation += 1;
        self.state = LoadState::Loading;
        Some(LoadTicket(self.generation))
    }

    /// Apply a listing result. Returns `false`, leaving the store untouched,
    /// unless `ticket` belongs to the load currently in progress.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: ApiResult<Vec<Summary>>) -> bool {
        if self.state != LoadState::Loading || ticket.0 != self.generation {
            tracing::debug!(ticket = ticket.0, current = self.generation, "dropping superseded summaries result");
            return false;
        }
        match result {
            Ok(summaries) => {
                tracing::info!(count = summaries.len(), "summaries loaded");
                self.store(summaries);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load summaries");
                self.state = LoadState::Failed(e.message());
            }
        }
        true
    }

    /// Drop held summaries so the next `begin_load` fetches again. Any load
    /// still in flight is superseded.
    pub fn reload(&mut self) {
        self.generation += 1;
        self.summaries.clear();
        self.groups = StrategyGroups::default();
        self.state = LoadState::Idle;
    }

    /// Synchronous load: begin, fetch, finish.
    pub fn load_with(&mut self, api: &dyn BacktestApi) -> &LoadState {
        if let Some(ticket) = self.begin_load() {
            self.finish_load(ticket, api.list_summaries());
        }
        &self.state
    }

    fn store(&mut self, summaries: Vec<Summary>) {
        self.groups = group_by_strategy(&summaries);
        self.summaries = summaries;
        self.state = LoadState::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::domain::Parameters;

    fn summary(id: u64, strategy: &str) -> Summary {
        Summary {
            id: BacktestId::new(id),
            strategy_name: strategy.to_string(),
            parameters: Parameters::default(),
            created_at: None,
            start_date: None,
            end_date: None,
            capital: None,
            symbols: Vec::new(),
        }
    }

    #[test]
    fn grouping_preserves_first_occurrence_and_member_order() {
        let groups = group_by_strategy(&[summary(1, "A"), summary(2, "B"), summary(3, "A")]);
        assert_eq!(groups.names(), vec!["A", "B"]);
        let a: Vec<u64> = groups.get("A").unwrap().iter().map(|s| s.id.get()).collect();
        assert_eq!(a, vec![1, 3]);
        let b: Vec<u64> = groups.get("B").unwrap().iter().map(|s| s.id.get()).collect();
        assert_eq!(b, vec![2]);
        assert!(groups.get("C").is_none());
    }

    #[test]
    fn empty_input_gives_empty_groups() {
        assert!(group_by_strategy(&[]).is_empty());
    }

    #[test]
    fn load_transitions_to_ready() {
        let mut store = SummariesStore::new();
        let ticket = store.begin_load().unwrap();
        assert!(store.is_loading());
        assert!(store.begin_load().is_none(), "second begin while loading is a no-op");
        assert!(store.finish_load(ticket, Ok(vec![summary(1, "A"), summary(2, "B")])));
        assert_eq!(store.state(), &LoadState::Ready);
        assert_eq!(store.groups().len(), 2);
        assert!(store.begin_load().is_none(), "held summaries suppress another fetch");
    }

    #[test]
    fn failure_keeps_no_data_and_allows_manual_reload() {
        let mut store = SummariesStore::new();
        let ticket = store.begin_load().unwrap();
        store.finish_load(ticket, Err(ApiError::Network("connection refused".into())));
        assert!(matches!(store.state(), LoadState::Failed(m) if m.contains("connection refused")));
        assert!(store.summaries().is_empty());
        assert!(store.begin_load().is_some());
    }

    #[test]
    fn reload_clears_and_refetch_regroups() {
        let mut store = SummariesStore::with_cached(vec![summary(1, "A")]);
        assert_eq!(store.state(), &LoadState::Ready);
        store.reload();
        assert_eq!(store.state(), &LoadState::Idle);
        let ticket = store.begin_load().unwrap();
        store.finish_load(ticket, Ok(vec![summary(5, "Z")]));
        assert_eq!(store.groups().names(), vec!["Z"]);
        assert_eq!(store.find(BacktestId::new(5)).unwrap().strategy_name, "Z");
    }

    #[test]
    fn result_without_a_load_in_progress_is_ignored() {
        let mut store = SummariesStore::with_cached(vec![summary(1, "A")]);
        store.reload();
        let ticket = store.begin_load().unwrap();
        assert!(store.finish_load(ticket, Ok(vec![summary(2, "B")])));
        assert!(!store.finish_load(ticket, Ok(vec![summary(3, "C")])), "replayed ticket");
        assert_eq!(store.groups().names(), vec!["B"]);
        assert_eq!(store.state(), &LoadState::Ready);
    }

    #[test]
    fn reload_supersedes_the_load_in_flight() {
        let mut store = SummariesStore::new();
        let old = store.begin_load().unwrap();
        store.reload();
        let new = store.begin_load().unwrap();
        assert!(!store.finish_load(old, Err(ApiError::Network("late".into()))));
        assert!(store.is_loading(), "stale failure must not end the new load");
        assert!(store.finish_load(new, Ok(vec![summary(7, "N")])));
        assert_eq!(store.groups().names(), vec!["N"]);
    }
}
