//! Error types for tree operations
//!
//! Every variant except [`NodeOperationError::Structural`] is a precondition that
//! did not hold. Those are routine in interactive use (pressing Tab on a first
//! child, Shift-Tab at top level) and always leave the store untouched.

use crate::tree::TreeError;
use thiserror::Error;

/// Reason a tree operation was not applied
///
/// # Examples
///
/// ```rust
/// use outline_core::operations::NodeOperationError;
///
/// let err = NodeOperationError::first_sibling("node-123");
/// assert!(err.is_precondition());
/// assert_eq!(
///     err.to_string(),
///     "Node 'node-123' is the first of its siblings and cannot be indented"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeOperationError {
    /// Referenced node does not exist
    #[error("Node '{node_id}' does not exist")]
    NodeNotFound { node_id: String },

    /// The operation needs a parent and the node is the root
    ///
    /// Adding a sibling to, deleting, indenting or moving the root.
    #[error("Cannot {operation} the root node '{node_id}'")]
    RootNotAllowed {
        node_id: String,
        operation: &'static str,
    },

    /// Indent on the first child: there is no previous sibling to adopt the node
    #[error("Node '{node_id}' is the first of its siblings and cannot be indented")]
    FirstSibling { node_id: String },

    /// Outdent on a top-level node: the parent is the root
    #[error("Node '{node_id}' is already at the top level and cannot be outdented")]
    ParentIsRoot { node_id: String },

    /// Move up on the first sibling, or move down on the last
    #[error("Node '{node_id}' cannot move {direction}: no sibling in that direction")]
    AtBoundary {
        node_id: String,
        direction: &'static str,
    },

    /// Drag target is the dragged node or lies inside its subtree
    #[error("Cannot move '{active_id}' relative to '{over_id}': target is inside the moved subtree")]
    MoveIntoOwnSubtree { active_id: String, over_id: String },

    /// Before/after placement relative to the root, which has no siblings
    #[error("Cannot place a node beside the root node '{over_id}'")]
    RootHasNoSiblings { over_id: String },

    /// Tag empty after normalization
    #[error("Invalid tag: '{tag}'")]
    InvalidTag { tag: String },

    /// Imported subtree is structurally invalid
    #[error("Structural error: {0}")]
    Structural(#[from] TreeError),
}

impl NodeOperationError {
    /// Create a NodeNotFound error
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create a RootNotAllowed error
    pub fn root_not_allowed(node_id: impl Into<String>, operation: &'static str) -> Self {
        Self::RootNotAllowed {
            node_id: node_id.into(),
            operation,
        }
    }

    /// Create a FirstSibling error
    pub fn first_sibling(node_id: impl Into<String>) -> Self {
        Self::FirstSibling {
            node_id: node_id.into(),
        }
    }

    /// Create a ParentIsRoot error
    pub fn parent_is_root(node_id: impl Into<String>) -> Self {
        Self::ParentIsRoot {
            node_id: node_id.into(),
        }
    }

    /// Create an AtBoundary error
    pub fn at_boundary(node_id: impl Into<String>, direction: &'static str) -> Self {
        Self::AtBoundary {
            node_id: node_id.into(),
            direction,
        }
    }

    /// Create a MoveIntoOwnSubtree error
    pub fn move_into_own_subtree(active_id: impl Into<String>, over_id: impl Into<String>) -> Self {
        Self::MoveIntoOwnSubtree {
            active_id: active_id.into(),
            over_id: over_id.into(),
        }
    }

    /// Create a RootHasNoSiblings error
    pub fn root_has_no_siblings(over_id: impl Into<String>) -> Self {
        Self::RootHasNoSiblings {
            over_id: over_id.into(),
        }
    }

    /// Create an InvalidTag error
    pub fn invalid_tag(tag: impl Into<String>) -> Self {
        Self::InvalidTag { tag: tag.into() }
    }

    /// Whether this is an ordinary unmet precondition rather than corruption
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::Structural(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_allowed_message() {
        let err = NodeOperationError::root_not_allowed("root-1", "delete");
        assert_eq!(err.to_string(), "Cannot delete the root node 'root-1'");
        assert!(err.is_precondition());
    }

    #[test]
    fn test_parent_is_root_message() {
        let err = NodeOperationError::parent_is_root("node-1");
        assert_eq!(
            err.to_string(),
            "Node 'node-1' is already at the top level and cannot be outdented"
        );
    }

    #[test]
    fn test_at_boundary_message() {
        let err = NodeOperationError::at_boundary("node-1", "up");
        assert_eq!(
            err.to_string(),
            "Node 'node-1' cannot move up: no sibling in that direction"
        );
    }

    #[test]
    fn test_structural_is_not_precondition() {
        let err: NodeOperationError = TreeError::DepthExceeded { limit: 3 }.into();
        assert!(!err.is_precondition());
        assert_eq!(
            err.to_string(),
            "Structural error: Tree exceeds the maximum depth of 3 levels"
        );
    }
}
