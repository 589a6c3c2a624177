//! Opened-backtest tabs and the current selection.

use serde::{Deserialize, Serialize};

use crate::domain::BacktestId;

/// Ordered set of open backtest ids with at most one selected.
///
/// Invariant: `selected` is always `None` or one of `open`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTabs {
    open: Vec<BacktestId>,
    selected: Option<BacktestId>,
}

impl OpenTabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted state, dropping duplicates and a dangling selection.
    pub fn restore(ids: &[BacktestId], selected: Option<BacktestId>) -> Self {
        let mut tabs = Self::new();
        for &id in ids {
            if !tabs.open.contains(&id) {
                tabs.open.push(id);
            }
        }
        tabs.selected = selected
            .filter(|id| tabs.open.contains(id))
            .or_else(|| tabs.open.last().copied());
        tabs
    }

    pub fn ids(&self) -> &[BacktestId] {
        &self.open
    }

    pub fn selected(&self) -> Option<BacktestId> {
        self.selected
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
            .and_then(|sel| self.open.iter().position(|&id| id == sel))
    }

    pub fn contains(&self, id: BacktestId) -> bool {
        self.open.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Open `id` (no duplicate tabs) and select it. Returns `true` if newly added.
    pub fn open(&mut self, id: BacktestId) -> bool {
        let added = !self.open.contains(&id);
        if added {
            self.open.push(id);
        }
        self.selected = Some(id);
        added
    }

    /// Select an open id. Ids that are not open are ignored.
    pub fn select(&mut self, id: BacktestId) -> bool {
        if self.open.contains(&id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn select_next(&mut self) {
        self.step(1);
    }

    pub fn select_prev(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, delta: isize) {
        if self.open.is_empty() {
            return;
        }
        let n = self.open.len() as isize;
        let cur = self.selected_index().map(|i| i as isize).unwrap_or(0);
        let next = (cur + delta).rem_euclid(n) as usize;
        self.selected = Some(self.open[next]);
    }

    /// Close `id`, returning the new selection.
    ///
    /// Closing the selected tab selects its left neighbour, else the first
    /// remaining tab, else nothing. Closing any other tab keeps the selection.
    pub fn close(&mut self, id: BacktestId) -> Option<BacktestId> {
        let Some(idx) = self.open.iter().position(|&o| o == id) else {
            return self.selected;
        };
        self.open.remove(idx);
        if self.selected == Some(id) {
            self.selected = if idx > 0 {
                Some(self.open[idx - 1])
            } else {
                self.open.first().copied()
            };
        }
        self.selected
    }
}
