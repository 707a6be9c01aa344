//! Structural error types for the node store
//!
//! These errors mean the store (or an imported tree) is corrupt. They are fatal for
//! the operation that detects them: callers must not continue with a partially
//! built tree.

use thiserror::Error;

/// Structural violations found while building, flattening or checking a tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Requested node is not in the store
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// A `children` list references a node that is not in the store
    #[error("Node '{parent_id}' references missing child '{child_id}'")]
    MissingChild { parent_id: String, child_id: String },

    /// A node was reached twice while walking the tree
    #[error("Node '{id}' is reachable more than once (cycle or shared child)")]
    Cycle { id: String },

    /// A child's `parent_id` disagrees with the node listing it
    #[error("Node '{id}' is listed under '{expected}' but points to parent {actual:?}")]
    ParentMismatch {
        id: String,
        expected: String,
        actual: Option<String>,
    },

    /// Cached level differs from the path length
    #[error("Node '{id}' has level {actual}, expected {expected}")]
    LevelMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// Root record is malformed (has a parent, or more than one parentless node)
    #[error("Invalid root: {0}")]
    InvalidRoot(String),

    /// Node exists in the store but is not reachable from the root
    #[error("Node '{id}' is not reachable from the root")]
    Unreachable { id: String },

    /// Tree deeper than the supported limit
    #[error("Tree exceeds the maximum depth of {limit} levels")]
    DepthExceeded { limit: usize },
}

impl TreeError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a missing child error
    pub fn missing_child(parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self::MissingChild {
            parent_id: parent_id.into(),
            child_id: child_id.into(),
        }
    }

    /// Create a cycle error
    pub fn cycle(id: impl Into<String>) -> Self {
        Self::Cycle { id: id.into() }
    }

    /// Create an invalid root error
    pub fn invalid_root(msg: impl Into<String>) -> Self {
        Self::InvalidRoot(msg.into())
    }
}
