//! TursoStore - DocumentStore Implementation for the libsql Backend
//!
//! Thin wrapper around [`DatabaseService`]: the SQL lives there, this module
//! converts between rows and [`Document`] values.
//!
//! # Row conversion
//!
//! - `root` is the nested tree serialized with `serde_json`, read back without
//!   a nesting limit so outlines of any allowed depth reload
//! - timestamps are RFC 3339 with microsecond precision, so text order equals
//!   time order; SQLite's `YYYY-MM-DD HH:MM:SS` form is accepted on read
//!
//! # Examples
//!
//! ```rust,no_run
//! use outline_core::db::{DatabaseService, DocumentStore, TursoStore};
//! use std::sync::Arc;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/outline.db")).await?);
//!     let store: Arc<dyn DocumentStore> = Arc::new(TursoStore::new(db));
//!
//!     for summary in store.list().await? {
//!         println!("{} {}", summary.id, summary.title);
//!     }
//!     Ok(())
//! }
//! ```

use crate::db::document_store::DocumentStore;
use crate::db::{DatabaseService, DbDocumentParams};
use crate::models::{
    DeleteResult, Document, DocumentMetadata, DocumentSummary, NestedNode, SystemTimeProvider,
    TimeProvider,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use libsql::Row;
use std::sync::Arc;

/// TursoStore implements DocumentStore for libsql databases
pub struct TursoStore {
    db: Arc<DatabaseService>,
    clock: Arc<dyn TimeProvider>,
}

impl TursoStore {
    /// Wrap a database service, stamping deletions with the system clock
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self::with_clock(db, Arc::new(SystemTimeProvider))
    }

    /// Wrap a database service with an injected clock
    pub fn with_clock(db: Arc<DatabaseService>, clock: Arc<dyn TimeProvider>) -> Self {
        Self { db, clock }
    }

    fn format_timestamp(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    /// Rows written by this store use RFC3339: "YYYY-MM-DDTHH:MM:SS.ffffffZ"
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
            s
        ))
    }

    fn parse_optional_timestamp(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
        s.as_deref().map(Self::parse_timestamp).transpose()
    }

    /// Convert a libsql row into a Document
    ///
    /// # Row Format
    ///
    /// Expected columns (in order):
    /// - id (TEXT)
    /// - title (TEXT)
    /// - root (TEXT, JSON nested tree)
    /// - created_at (TEXT)
    /// - updated_at (TEXT)
    /// - version (INTEGER)
    /// - deleted_at (TEXT, nullable)
    fn row_to_document(row: &Row) -> Result<Document> {
        let id: String = row.get(0).context("Failed to get id")?;
        let title: String = row.get(1).context("Failed to get title")?;
        let root_json: String = row.get(2).context("Failed to get root")?;
        let created_at: String = row.get(3).context("Failed to get created_at")?;
        let updated_at: String = row.get(4).context("Failed to get updated_at")?;
        let version: i64 = row.get(5).context("Failed to get version")?;
        let deleted_at: Option<String> = row.get(6).context("Failed to get deleted_at")?;

        let root = NestedNode::from_json(&root_json)
            .with_context(|| format!("Failed to parse tree of document '{}'", id))?;

        Ok(Document {
            title,
            root,
            metadata: DocumentMetadata {
                created_at: Self::parse_timestamp(&created_at)?,
                updated_at: Self::parse_timestamp(&updated_at)?,
                version,
                deleted_at: Self::parse_optional_timestamp(deleted_at)?,
            },
            id,
        })
    }

    /// Convert a listing row (id, title, updated_at, deleted_at) into a summary
    fn row_to_summary(row: &Row) -> Result<DocumentSummary> {
        let id: String = row.get(0).context("Failed to get id")?;
        let title: String = row.get(1).context("Failed to get title")?;
        let updated_at: String = row.get(2).context("Failed to get updated_at")?;
        let deleted_at: Option<String> = row.get(3).context("Failed to get deleted_at")?;

        Ok(DocumentSummary {
            id,
            title,
            updated_at: Self::parse_timestamp(&updated_at)?,
            deleted_at: Self::parse_optional_timestamp(deleted_at)?,
        })
    }
}

#[async_trait]
impl DocumentStore for TursoStore {
    async fn save(&self, mut document: Document) -> Result<Document> {
        let root_json = serde_json::to_string(&document.root)
            .with_context(|| format!("Failed to serialize document '{}'", document.id))?;

        // Stored precision is microseconds
        let metadata = &mut document.metadata;
        metadata.updated_at = metadata.updated_at.trunc_subsecs(6);
        metadata.created_at = metadata.created_at.trunc_subsecs(6);
        metadata.deleted_at = metadata.deleted_at.map(|ts| ts.trunc_subsecs(6));

        let created_at = Self::format_timestamp(&metadata.created_at);
        let updated_at = Self::format_timestamp(&metadata.updated_at);
        let deleted_at = metadata.deleted_at.as_ref().map(Self::format_timestamp);

        let (version, stored_created_at) = self
            .db
            .db_upsert_document(DbDocumentParams {
                id: &document.id,
                title: &document.title,
                root: &root_json,
                created_at: &created_at,
                updated_at: &updated_at,
                deleted_at: deleted_at.as_deref(),
            })
            .await
            .with_context(|| format!("Failed to save document '{}'", document.id))?;

        document.metadata.version = version;
        document.metadata.created_at = Self::parse_timestamp(&stored_created_at)?;
        tracing::info!(
            "Saved document '{}' (version {})",
            document.id,
            document.metadata.version
        );
        Ok(document)
    }

    async fn load(&self, id: &str) -> Result<Option<Document>> {
        let row = self
            .db
            .db_get_document(id)
            .await
            .with_context(|| format!("Failed to load document '{}'", id))?;
        match row {
            Some(row) => {
                let document = Self::row_to_document(&row)?;
                tracing::info!("Loaded document '{}'", id);
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let mut rows = self
            .db
            .db_list_documents()
            .await
            .context("Failed to list documents")?;

        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read document row")? {
            summaries.push(Self::row_to_summary(&row)?);
        }
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<DeleteResult> {
        let now = Self::format_timestamp(&self.clock.now());
        let matched = self
            .db
            .db_mark_deleted(id, &now)
            .await
            .with_context(|| format!("Failed to delete document '{}'", id))?;
        Ok(if matched > 0 {
            DeleteResult::existed()
        } else {
            DeleteResult::not_found()
        })
    }

    async fn restore(&self, id: &str) -> Result<bool> {
        let matched = self
            .db
            .db_clear_deleted(id)
            .await
            .with_context(|| format!("Failed to restore document '{}'", id))?;
        Ok(matched > 0)
    }

    async fn purge(&self, id: &str) -> Result<DeleteResult> {
        let removed = self
            .db
            .db_purge_document(id)
            .await
            .with_context(|| format!("Failed to purge document '{}'", id))?;
        Ok(if removed > 0 {
            DeleteResult::existed()
        } else {
            DeleteResult::not_found()
        })
    }

    async fn close(&self) -> Result<()> {
        self.db.db_close().await.context("Failed to close database")
    }
}
