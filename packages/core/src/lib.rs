//! Outline Core Business Logic Layer
//!
//! This crate provides the tree-editing core, undo/redo history, persistence and
//! service orchestration of a hierarchical outline editor.
//!
//! # Architecture
//!
//! - **Flat store**: nodes live in an id-indexed map with parent back-references
//!   and ordered child ids; the nested tree is derived on demand
//! - **Snapshot history**: every session operation commits a full snapshot,
//!   capped at 30 undo steps
//! - **libsql/Turso**: documents persist as whole nested trees in an embedded,
//!   in-memory or remote libsql database
//!
//! # Modules
//!
//! - [`tree`] - Node store, builder/flattener and integrity checks
//! - [`operations`] - Structural edits (add, delete, indent, outdent, move)
//! - [`history`] - Snapshot-based undo/redo
//! - [`diff`] - Content-matched tree diff for reorganize proposals
//! - [`services`] - Editor sessions, autosave and the reorganize round-trip
//! - [`db`] - Document repository with libsql integration
//! - [`export`] - JSON and HTML export
//! - [`config`] - Environment-driven storage selection
//!
//! # Example
//!
//! ```rust
//! use outline_core::tree::NodeStore;
//!
//! let mut store = NodeStore::new("Groceries");
//! let root = store.root_id().to_string();
//! let milk = store.add_child(&root).unwrap();
//! let eggs = store.add_sibling(&milk).unwrap();
//! store.indent(&eggs).unwrap();
//!
//! assert_eq!(store.get(&eggs).unwrap().parent_id.as_deref(), Some(milk.as_str()));
//! assert_eq!(store.get(&eggs).unwrap().level, 2);
//! ```

pub mod config;
pub mod db;
pub mod diff;
pub mod export;
pub mod history;
pub mod models;
pub mod operations;
pub mod services;
pub mod tree;
pub mod utils;

// Re-export commonly used types
pub use config::StorageConfig;
pub use diff::{diff_trees, DiffSummary, TreeChange};
pub use history::HistoryManager;
pub use models::*;
pub use operations::{NodeOperationError, OperationResult, Placement};
pub use services::*;
pub use tree::{NodeStore, TreeError};
