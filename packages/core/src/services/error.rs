//! Service Layer Error Types
//!
//! Errors surfaced by editing sessions and the reorganize round-trip. Lower
//! layer errors convert in with `#[from]`.

use crate::operations::NodeOperationError;
use crate::tree::TreeError;
use thiserror::Error;

/// Editing session errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Document id unknown to the repository
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    /// A tree operation's precondition did not hold
    #[error("Operation not applied: {0}")]
    Operation(#[from] NodeOperationError),

    /// Stored or imported tree is structurally invalid
    #[error("Invalid document tree: {0}")]
    InvalidTree(#[from] TreeError),

    /// Repository call failed
    #[error("Storage operation failed: {context}")]
    Storage { context: String },

    /// A save for this session has not finished yet
    #[error("A save is already in progress")]
    SaveInProgress,

    /// Serialization of an export failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Reorganize failed: {0}")]
    Reorganize(#[from] ReorganizeError),
}

impl SessionError {
    /// Create a document not found error
    pub fn document_not_found(id: impl Into<String>) -> Self {
        Self::DocumentNotFound { id: id.into() }
    }

    /// Wrap a repository error, keeping its context chain
    pub fn storage(err: &anyhow::Error) -> Self {
        Self::Storage {
            context: format!("{:#}", err),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors of the AI reorganize round-trip
///
/// None of them leaves a change in the store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReorganizeError {
    /// Node to reorganize does not exist (or no longer exists at accept time)
    #[error("Node '{node_id}' does not exist")]
    TargetNotFound { node_id: String },

    /// Subtree could not be built for the request
    #[error("Invalid subtree: {0}")]
    InvalidTree(#[from] TreeError),

    /// The reorganizer call failed
    #[error("Reorganizer request failed: {0}")]
    Collaborator(String),

    /// The reorganizer answered with something unusable
    #[error("Invalid reorganizer response: {reason}")]
    InvalidResponse { reason: String },
}

impl ReorganizeError {
    /// Create a target not found error
    pub fn target_not_found(node_id: impl Into<String>) -> Self {
        Self::TargetNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}
