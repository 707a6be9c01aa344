//! DocumentStore Trait - Document Repository Abstraction
//!
//! Persistence boundary of the editor. A session only ever talks to a
//! `dyn DocumentStore`, so the libsql backend ([`TursoStore`](crate::db::TursoStore))
//! can be swapped for a test double or another backend without touching the
//! editing logic.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: embedded and remote backends share one interface
//! 2. **Whole documents**: a save writes the complete nested tree; there are no
//!    per-node writes
//! 3. **Last write wins** per document id
//! 4. **Soft delete**: `delete` only stamps `deleted_at`; `purge` removes the row
//! 5. **Error Handling**: `anyhow::Result` with context at each failure point
//!
//! # Examples
//!
//! ```rust,no_run
//! use outline_core::db::{DatabaseService, DocumentStore, TursoStore};
//! use outline_core::models::{Document, DocumentMetadata, NestedNode};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new_in_memory().await?);
//!     let store: Arc<dyn DocumentStore> = Arc::new(TursoStore::new(db));
//!
//!     let document = Document {
//!         id: "doc-1".to_string(),
//!         title: "Groceries".to_string(),
//!         root: NestedNode::new("Groceries"),
//!         metadata: DocumentMetadata::new(chrono::Utc::now()),
//!     };
//!     let saved = store.save(document).await?;
//!     assert_eq!(saved.metadata.version, 1);
//!     Ok(())
//! }
//! ```

use crate::models::{DeleteResult, Document, DocumentSummary};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for document persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a session can hold them behind an
/// `Arc` and save from any task.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace a document
    ///
    /// # Returns
    ///
    /// The document as stored: `metadata.version` is the new save revision
    /// (1 on first save, previous + 1 afterwards) and `created_at` is the one
    /// recorded on first save.
    async fn save(&self, document: Document) -> Result<Document>;

    /// Fetch a document by id
    ///
    /// Soft-deleted documents are returned too; check
    /// [`DocumentMetadata::is_deleted`](crate::models::DocumentMetadata::is_deleted).
    async fn load(&self, id: &str) -> Result<Option<Document>>;

    /// Summaries of all documents, most recently updated first
    ///
    /// Includes soft-deleted documents; callers filter on `deleted_at`.
    async fn list(&self) -> Result<Vec<DocumentSummary>>;

    /// Soft-delete: stamp `deleted_at` with the current time
    ///
    /// Idempotent; deleting a missing document reports `existed: false`.
    async fn delete(&self, id: &str) -> Result<DeleteResult>;

    /// Clear `deleted_at`; returns false when the document does not exist
    async fn restore(&self, id: &str) -> Result<bool>;

    /// Permanently remove a document
    async fn purge(&self, id: &str) -> Result<DeleteResult>;

    /// Flush pending writes before shutdown
    async fn close(&self) -> Result<()>;
}
