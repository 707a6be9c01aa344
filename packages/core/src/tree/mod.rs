//! Node Store
//!
//! The authoritative, mutable state of one outline: a flat map from node id to
//! [`Node`], plus the id of the single root and the document title.
//!
//! # Architecture
//!
//! - **Arena + index**: nodes live in a `HashMap` and reference each other by id.
//!   Every traversal walks that map with an explicit stack, so pathological depth
//!   never grows the call stack.
//! - **Single owner**: an editing session owns exactly one store and passes it by
//!   `&mut` into the tree operations (see [`crate::operations`]).
//! - **Derived views**: the nested form ([`builder`]) and the visible traversal are
//!   computed on demand, never cached.
//!
//! # Invariants
//!
//! 1. Exactly one node has no parent (the root); every other node is reachable from it.
//! 2. `children` lists hold no duplicates and only ids present in the store.
//! 3. A node's `parent_id` names the unique node whose `children` lists it.
//! 4. `level` equals the path length from the root.
//! 5. No cycles.
//!
//! [`NodeStore::check_integrity`] verifies all of them.

pub mod builder;
mod error;
mod integrity;

pub use builder::{IdPolicy, MAX_TREE_DEPTH};
pub use error::TreeError;

use crate::history::HistoryState;
use crate::models::{Node, SystemTimeProvider, TimeProvider};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Flat, id-indexed outline tree
#[derive(Clone)]
pub struct NodeStore {
    nodes: HashMap<String, Node>,
    root_id: String,
    title: String,
    clock: Arc<dyn TimeProvider>,
}

impl fmt::Debug for NodeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeStore")
            .field("root_id", &self.root_id)
            .field("title", &self.title)
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl NodeStore {
    /// Create a store holding a single empty root, using the system clock
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_clock(title, Arc::new(SystemTimeProvider))
    }

    /// Create a store holding a single empty root, reading time from `clock`
    pub fn with_clock(title: impl Into<String>, clock: Arc<dyn TimeProvider>) -> Self {
        let root = Node::new_root(String::new(), clock.now());
        let root_id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), root);
        Self {
            nodes,
            root_id,
            title: title.into(),
            clock,
        }
    }

    /// Assemble a store from parts produced by the flattener
    pub(crate) fn from_parts(
        nodes: HashMap<String, Node>,
        root_id: String,
        title: String,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            nodes,
            root_id,
            title,
            clock,
        }
    }

    /// Look up a node by id
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Node> {
        self.nodes.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// The root node
    ///
    /// Present by construction; the store never removes its root.
    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&self.root_id)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, in no particular order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn clock(&self) -> Arc<dyn TimeProvider> {
        Arc::clone(&self.clock)
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Parent id and index of `id` within its parent's children
    ///
    /// `None` for the root and for unknown ids.
    pub fn position(&self, id: &str) -> Option<(&str, usize)> {
        let parent_id = self.nodes.get(id)?.parent_id.as_deref()?;
        let index = self.nodes.get(parent_id)?.child_index(id)?;
        Some((parent_id, index))
    }

    /// Ids of the subtree rooted at `id`, in pre-order (`id` first)
    ///
    /// Empty when `id` is unknown. Dangling child references are skipped.
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(node.id.clone());
            stack.extend(node.children.iter().rev().map(String::as_str));
        }
        out
    }

    /// Ancestor ids of `id`, nearest first (parent, grandparent, ..., root)
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(id).and_then(|n| n.parent_id.as_deref());
        while let Some(parent_id) = current {
            // Guard against corrupt parent chains
            if out.len() > self.nodes.len() {
                break;
            }
            out.push(parent_id.to_string());
            current = self.nodes.get(parent_id).and_then(|n| n.parent_id.as_deref());
        }
        out
    }

    /// Check whether `candidate` lies strictly below `ancestor`
    pub fn is_descendant(&self, ancestor: &str, candidate: &str) -> bool {
        self.ancestors(candidate).iter().any(|id| id == ancestor)
    }

    /// Contents of the nodes from the root down to the parent of `id`
    pub fn path_of(&self, id: &str) -> Vec<String> {
        let mut path: Vec<String> = self
            .ancestors(id)
            .iter()
            .filter_map(|ancestor| self.nodes.get(ancestor))
            .map(|node| node.content.clone())
            .collect();
        path.reverse();
        path
    }

    /// Display traversal: pre-order from the root, skipping the children of
    /// collapsed nodes. The root itself is not included.
    pub fn visible_nodes(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let Some(root) = self.root() else {
            return out;
        };
        let mut stack: Vec<&str> = root.children.iter().rev().map(String::as_str).collect();
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(node);
            if !node.collapsed {
                stack.extend(node.children.iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Nodes carrying `tag`, in document order
    pub fn nodes_with_tag(&self, tag: &str) -> Vec<&Node> {
        self.subtree_ids(&self.root_id)
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|node| node.has_tag(tag))
            .collect()
    }

    /// Deep copy of the current state, for the history manager
    pub fn snapshot(&self) -> HistoryState {
        HistoryState {
            nodes: self.nodes.clone(),
            root_id: self.root_id.clone(),
            title: self.title.clone(),
        }
    }

    /// Replace the live state with a snapshot's contents
    pub fn restore(&mut self, state: &HistoryState) {
        self.nodes = state.nodes.clone();
        self.root_id = state.root_id.clone();
        self.title = state.title.clone();
    }

    /// Check whether the live state equals a snapshot
    pub fn matches(&self, state: &HistoryState) -> bool {
        self.root_id == state.root_id && self.title == state.title && self.nodes == state.nodes
    }
}
