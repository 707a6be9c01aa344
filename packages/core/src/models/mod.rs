//! Data Models
//!
//! This module contains the core data structures of the outline:
//!
//! - `Node` - Flat node record held by the node store
//! - `NestedNode` / `Document` - Nested wire and storage format
//! - `EditorSettings` - Settings exported alongside a document
//! - `time` - Injectable clock used for node and autosave timestamps

mod document;
mod node;
mod settings;
pub mod time;

pub use document::{Document, DocumentMetadata, DocumentSummary, NestedIter, NestedNode};
pub use node::{new_node_id, DeleteResult, ImageAttachment, Node};
pub use settings::EditorSettings;
pub use time::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
