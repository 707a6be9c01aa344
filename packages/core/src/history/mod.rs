//! History Manager
//!
//! Linear, snapshot-based undo/redo. Every committed mutation stores a full deep
//! copy of the store; undo and redo swap those copies back in. Snapshots are
//! compared structurally, so committing an unchanged store records nothing.
//!
//! ```rust
//! use outline_core::history::HistoryManager;
//! use outline_core::tree::NodeStore;
//!
//! let mut store = NodeStore::new("Notes");
//! let mut history = HistoryManager::new();
//! history.commit(&store);
//!
//! let root = store.root_id().to_string();
//! store.add_child(&root).unwrap();
//! history.commit(&store);
//! assert_eq!(store.len(), 2);
//!
//! history.undo(&mut store);
//! assert_eq!(store.len(), 1);
//! history.redo(&mut store);
//! assert_eq!(store.len(), 2);
//! ```

use crate::models::Node;
use crate::tree::NodeStore;
use std::collections::{HashMap, VecDeque};

/// Number of undo steps kept by default
pub const DEFAULT_HISTORY_DEPTH: usize = 30;

/// Deep, independent copy of a store's contents
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    pub nodes: HashMap<String, Node>,
    pub root_id: String,
    pub title: String,
}

/// What a call to [`HistoryManager::commit`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// First commit: the state became `present`, nothing to undo yet
    Seeded,
    /// Store equals `present`
    Unchanged,
    /// Previous `present` pushed onto the undo stack
    Recorded,
}

/// Undo/redo stacks around a single `present` snapshot
#[derive(Debug, Clone)]
pub struct HistoryManager {
    past: VecDeque<HistoryState>,
    present: Option<HistoryState>,
    future: VecDeque<HistoryState>,
    max_depth: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// History keeping at most `max_depth` undo steps (at least one)
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: None,
            future: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the store's current state
    pub fn commit(&mut self, store: &NodeStore) -> CommitOutcome {
        let Some(present) = self.present.as_ref() else {
            self.present = Some(store.snapshot());
            return CommitOutcome::Seeded;
        };
        if store.matches(present) {
            tracing::debug!("History commit skipped: state unchanged");
            return CommitOutcome::Unchanged;
        }

        if let Some(previous) = self.present.replace(store.snapshot()) {
            self.past.push_back(previous);
        }
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
        CommitOutcome::Recorded
    }

    /// Step back one state; returns false when there is nothing to undo
    pub fn undo(&mut self, store: &mut NodeStore) -> bool {
        if self.present.is_none() {
            return false;
        }
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        store.restore(&previous);
        if let Some(current) = self.present.replace(previous) {
            self.future.push_front(current);
        }
        true
    }

    /// Step forward one undone state; returns false when there is nothing to redo
    pub fn redo(&mut self, store: &mut NodeStore) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        store.restore(&next);
        if let Some(current) = self.present.replace(next) {
            self.past.push_back(current);
        }
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        true
    }

    /// Drop all history and seed `present` from the store (document load)
    pub fn reset(&mut self, store: &NodeStore) {
        self.past.clear();
        self.future.clear();
        self.present = Some(store.snapshot());
    }

    pub fn can_undo(&self) -> bool {
        self.present.is_some() && !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_child() -> (NodeStore, String) {
        let mut store = NodeStore::new("Doc");
        let root = store.root_id().to_string();
        let child = store.add_child(&root).unwrap();
        (store, child)
    }

    #[test]
    fn test_first_commit_seeds_present() {
        let (store, _) = store_with_child();
        let mut history = HistoryManager::new();
        assert_eq!(history.commit(&store), CommitOutcome::Seeded);
        assert!(!history.can_undo());
        assert_eq!(history.commit(&store), CommitOutcome::Unchanged);
        assert_eq!(history.past_len(), 0);
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let (mut store, child) = store_with_child();
        let mut history = HistoryManager::new();
        history.commit(&store);
        let before = store.snapshot();

        store.update_content(&child, "edited").unwrap();
        assert_eq!(history.commit(&store), CommitOutcome::Recorded);

        assert!(history.undo(&mut store));
        assert!(store.matches(&before));
        assert!(history.can_redo());
    }

    #[test]
    fn test_undo_then_redo_restores_pre_undo_state() {
        let (mut store, child) = store_with_child();
        let mut history = HistoryManager::new();
        history.commit(&store);
        store.update_content(&child, "one").unwrap();
        history.commit(&store);
        store.update_content(&child, "two").unwrap();
        history.commit(&store);
        let latest = store.snapshot();

        assert!(history.undo(&mut store));
        assert!(history.undo(&mut store));
        assert_eq!(store.get(&child).unwrap().content, "");
        assert!(!history.undo(&mut store));

        assert!(history.redo(&mut store));
        assert!(history.redo(&mut store));
        assert!(store.matches(&latest));
        assert!(!history.redo(&mut store));
    }

    #[test]
    fn test_new_commit_clears_future() {
        let (mut store, child) = store_with_child();
        let mut history = HistoryManager::new();
        history.commit(&store);
        store.update_content(&child, "one").unwrap();
        history.commit(&store);
        history.undo(&mut store);
        assert_eq!(history.future_len(), 1);

        store.update_content(&child, "other").unwrap();
        history.commit(&store);
        assert_eq!(history.future_len(), 0);
        assert!(!history.redo(&mut store));
    }

    #[test]
    fn test_history_is_capped() {
        let (mut store, child) = store_with_child();
        let mut history = HistoryManager::new();
        history.commit(&store);

        for i in 0..35 {
            store.update_content(&child, format!("edit {}", i)).unwrap();
            history.commit(&store);
        }
        assert_eq!(history.past_len(), DEFAULT_HISTORY_DEPTH);

        let mut steps = 0;
        while history.undo(&mut store) {
            steps += 1;
        }
        assert_eq!(steps, 30);
        // The seed and the first four edits fell off the back
        assert_eq!(store.get(&child).unwrap().content, "edit 4");
    }

    #[test]
    fn test_undo_without_present_is_noop() {
        let (mut store, _) = store_with_child();
        let before = store.snapshot();
        let mut history = HistoryManager::new();
        assert!(!history.undo(&mut store));
        assert!(!history.redo(&mut store));
        assert!(store.matches(&before));
    }

    #[test]
    fn test_reset_drops_history() {
        let (mut store, child) = store_with_child();
        let mut history = HistoryManager::with_depth(5);
        history.commit(&store);
        store.update_content(&child, "x").unwrap();
        history.commit(&store);

        history.reset(&store);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.max_depth(), 5);
    }
}
