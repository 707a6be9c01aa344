//! Database Connection Management
//!
//! Opens the libsql database selected by [`StorageConfig`] and owns the SQL for
//! the `documents` table. Row-to-model conversion lives in
//! [`TursoStore`](crate::db::TursoStore); this layer returns raw rows.
//!
//! # Architecture
//!
//! - **One table**: a document is stored whole, with its nested tree as a JSON
//!   column. Saves replace the row; there is no per-node table to migrate.
//! - **Three backends, one API**: embedded file, in-memory, or remote libsql
//!   server, all through `libsql::Builder`.
//! - **WAL mode** and a 5 second busy timeout on embedded files.
//!
//! # Connections
//!
//! The service opens a single connection and hands out clones of it. An
//! in-memory database exists only inside the connection that created it, so a
//! fresh `connect()` per call would see an empty database.
//!
//! ```no_run
//! # use outline_core::db::DatabaseService;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new_in_memory().await?;
//! let conn = db_service.connection();
//! # Ok(())
//! # }
//! ```

use crate::config::StorageConfig;
use crate::db::error::DatabaseError;
use libsql::{params, Builder, Connection, Database};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Database service for managing the libsql connection and schema
#[derive(Clone)]
pub struct DatabaseService {
    /// Held so the database outlives every clone of `conn`
    _db: Arc<Database>,
    conn: Connection,

    /// Path to the database file; `None` for in-memory and remote databases
    pub db_path: Option<PathBuf>,

    location: String,
}

impl fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseService")
            .field("location", &self.location)
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

/// Parameters for a document upsert (avoids too-many-arguments lint)
pub struct DbDocumentParams<'a> {
    pub id: &'a str,
    pub title: &'a str,
    /// Nested tree, serialized as JSON
    pub root: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
    pub deleted_at: Option<&'a str>,
}

impl DatabaseService {
    /// Open (or create) an embedded database file
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Enable WAL mode and the busy timeout
    /// 4. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - `db_path` is a directory
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if db_path.is_dir() {
            return Err(DatabaseError::invalid_path(db_path));
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let location = format!("local database at {}", db_path.display());
        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(location.clone(), e))?;

        let service = Self::open(db, Some(db_path), location)?;
        service.execute_pragma("PRAGMA journal_mode = WAL").await?;
        service.execute_pragma("PRAGMA busy_timeout = 5000").await?;
        service.initialize_schema().await?;
        Ok(service)
    }

    /// Open a database that lives only as long as this service
    pub async fn new_in_memory() -> Result<Self, DatabaseError> {
        let location = "in-memory database".to_string();
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(location.clone(), e))?;

        let service = Self::open(db, None, location)?;
        service.initialize_schema().await?;
        Ok(service)
    }

    /// Connect to a remote libsql server
    ///
    /// PRAGMAs are server-side concerns and are not issued.
    pub async fn new_remote(url: &str, auth_token: Option<&str>) -> Result<Self, DatabaseError> {
        let location = format!("remote database at {}", url);
        let db = Builder::new_remote(url.to_string(), auth_token.unwrap_or_default().to_string())
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(location.clone(), e))?;

        let service = Self::open(db, None, location)?;
        service.initialize_schema().await?;
        Ok(service)
    }

    /// Open whichever database `config` selects
    pub async fn from_config(config: &StorageConfig) -> Result<Self, DatabaseError> {
        tracing::info!("Opening {}", config);
        match config {
            StorageConfig::Local { path } => Self::new(path.clone()).await,
            StorageConfig::Memory => Self::new_in_memory().await,
            StorageConfig::Remote { url, auth_token } => {
                Self::new_remote(url, auth_token.as_deref()).await
            }
        }
    }

    fn open(db: Database, db_path: Option<PathBuf>, location: String) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::connection_failed(location.clone(), e))?;
        Ok(Self {
            _db: Arc::new(db),
            conn,
            db_path,
            location,
        })
    }

    /// Human-readable description of the backing database
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Handle to the shared connection
    pub fn connection(&self) -> Connection {
        self.conn.clone()
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(&self, pragma: &str) -> Result<(), DatabaseError> {
        let mut stmt = self.conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes (idempotent)
    ///
    /// # Schema
    ///
    /// - `documents` table: one row per document, nested tree in `root` (JSON)
    /// - `idx_documents_updated`: ordering for `list`
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS documents (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    root JSON NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    version INTEGER NOT NULL DEFAULT 1,
                    deleted_at TEXT
                )",
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create documents table: {}",
                    e
                ))
            })?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_documents_updated ON documents(updated_at)",
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create index 'idx_documents_updated': {}",
                    e
                ))
            })?;

        tracing::debug!("Schema ready on {}", self.location);
        Ok(())
    }

    //
    // DOCUMENT OPERATIONS
    // Raw SQL for the documents table, wrapped by TursoStore.
    //

    /// Insert or replace a document, returning its new version and stored `created_at`
    ///
    /// The first save stores version 1; every later save increments the stored
    /// version. `created_at` of an existing row is kept.
    pub async fn db_upsert_document(
        &self,
        params: DbDocumentParams<'_>,
    ) -> Result<(i64, String), DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO documents (id, title, root, created_at, updated_at, version, deleted_at)
                 VALUES (?, ?, ?, ?, ?, 1, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    root = excluded.root,
                    updated_at = excluded.updated_at,
                    deleted_at = excluded.deleted_at,
                    version = documents.version + 1",
                params![
                    params.id,
                    params.title,
                    params.root,
                    params.created_at,
                    params.updated_at,
                    params.deleted_at
                ],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to save document '{}': {}",
                    params.id, e
                ))
            })?;

        let mut rows = self
            .conn
            .query(
                "SELECT version, created_at FROM documents WHERE id = ?",
                [params.id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to read document version: {}", e))
            })?;
        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
            .ok_or_else(|| {
                DatabaseError::sql_execution(format!(
                    "Document '{}' missing right after save",
                    params.id
                ))
            })?;
        let version = row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::sql_execution(format!("Invalid version column: {}", e)))?;
        let created_at = row
            .get::<String>(1)
            .map_err(|e| DatabaseError::sql_execution(format!("Invalid created_at column: {}", e)))?;
        Ok((version, created_at))
    }

    /// Fetch one document row
    ///
    /// Columns: id, title, root, created_at, updated_at, version, deleted_at
    pub async fn db_get_document(&self, id: &str) -> Result<Option<libsql::Row>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, root, created_at, updated_at, version, deleted_at
                 FROM documents WHERE id = ?",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_document query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_document query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// All documents, most recently updated first, soft-deleted ones included
    ///
    /// Columns: id, title, updated_at, deleted_at
    pub async fn db_list_documents(&self) -> Result<libsql::Rows, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, updated_at, deleted_at
                 FROM documents ORDER BY updated_at DESC, id ASC",
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare list query: {}", e))
            })?;

        stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute list query: {}", e))
        })
    }

    /// Stamp `deleted_at` unless already set; returns the number of rows matched
    pub async fn db_mark_deleted(&self, id: &str, deleted_at: &str) -> Result<u64, DatabaseError> {
        self.conn
            .execute(
                "UPDATE documents SET deleted_at = COALESCE(deleted_at, ?) WHERE id = ?",
                params![deleted_at, id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete document '{}': {}", id, e))
            })
    }

    /// Clear `deleted_at`; returns the number of rows matched
    pub async fn db_clear_deleted(&self, id: &str) -> Result<u64, DatabaseError> {
        self.conn
            .execute("UPDATE documents SET deleted_at = NULL WHERE id = ?", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to restore document '{}': {}", id, e))
            })
    }

    /// Permanently delete a document; returns the number of rows removed
    pub async fn db_purge_document(&self, id: &str) -> Result<u64, DatabaseError> {
        self.conn
            .execute("DELETE FROM documents WHERE id = ?", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to purge document '{}': {}", id, e))
            })
    }

    /// Flush pending writes before shutdown
    ///
    /// Checkpoints the WAL of embedded files; a no-op for other backends.
    pub async fn db_close(&self) -> Result<(), DatabaseError> {
        if self.db_path.is_some() {
            self.execute_pragma("PRAGMA wal_checkpoint(TRUNCATE)").await?;
        }
        tracing::debug!("Closed {}", self.location);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc_params<'a>(id: &'a str, title: &'a str, updated_at: &'a str) -> DbDocumentParams<'a> {
        DbDocumentParams {
            id,
            title,
            root: r#"{"content":"","children":[]}"#,
            created_at: "2025-01-01T00:00:00.000000Z",
            updated_at,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path.clone()).await.unwrap();

        assert_eq!(db_service.db_path, Some(db_path.clone()));
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();
        let conn = db_service.connection();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='documents'")
            .await
            .unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let table_name: String = row.get(0).unwrap();
        assert_eq!(table_name, "documents");
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connection();

        let mut stmt = conn.prepare("PRAGMA journal_mode").await.unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let mode: String = row.get(0).unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_parent_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dirs").join("test.db");

        let _db_service = DatabaseService::new(nested_path.clone()).await.unwrap();

        assert!(nested_path.exists());
    }

    #[tokio::test]
    async fn test_directory_path_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let err = DatabaseService::new(temp_dir.path().to_path_buf())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_idempotent_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let first = DatabaseService::new(db_path.clone()).await.unwrap();
        first
            .db_upsert_document(doc_params("d1", "Kept", "2025-01-01T00:00:00.000000Z"))
            .await
            .unwrap();
        first.db_close().await.unwrap();

        let second = DatabaseService::new(db_path).await.unwrap();
        let row = second.db_get_document("d1").await.unwrap().unwrap();
        let title: String = row.get(1).unwrap();
        assert_eq!(title, "Kept");
    }

    #[tokio::test]
    async fn test_upsert_increments_version() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();

        let (v1, _) = db_service
            .db_upsert_document(doc_params("d1", "First", "2025-01-01T00:00:00.000000Z"))
            .await
            .unwrap();
        let (v2, created_at) = db_service
            .db_upsert_document(doc_params("d1", "Second", "2025-01-02T00:00:00.000000Z"))
            .await
            .unwrap();
        assert_eq!((v1, v2), (1, 2));
        assert_eq!(created_at, "2025-01-01T00:00:00.000000Z");

        let row = db_service.db_get_document("d1").await.unwrap().unwrap();
        let title: String = row.get(1).unwrap();
        let created_at: String = row.get(3).unwrap();
        assert_eq!(title, "Second");
        assert_eq!(created_at, "2025-01-01T00:00:00.000000Z");
    }

    #[tokio::test]
    async fn test_soft_delete_and_purge() {
        let db_service = DatabaseService::new_in_memory().await.unwrap();
        db_service
            .db_upsert_document(doc_params("d1", "Doc", "2025-01-01T00:00:00.000000Z"))
            .await
            .unwrap();

        let touched = db_service
            .db_mark_deleted("d1", "2025-02-01T00:00:00.000000Z")
            .await
            .unwrap();
        assert_eq!(touched, 1);
        // A second delete keeps the first timestamp
        db_service
            .db_mark_deleted("d1", "2025-03-01T00:00:00.000000Z")
            .await
            .unwrap();
        let row = db_service.db_get_document("d1").await.unwrap().unwrap();
        let deleted_at: Option<String> = row.get(6).unwrap();
        assert_eq!(deleted_at.as_deref(), Some("2025-02-01T00:00:00.000000Z"));

        assert_eq!(db_service.db_clear_deleted("d1").await.unwrap(), 1);
        let row = db_service.db_get_document("d1").await.unwrap().unwrap();
        let deleted_at: Option<String> = row.get(6).unwrap();
        assert!(deleted_at.is_none());

        assert_eq!(db_service.db_purge_document("d1").await.unwrap(), 1);
        assert!(db_service.db_get_document("d1").await.unwrap().is_none());
        assert_eq!(db_service.db_purge_document("d1").await.unwrap(), 0);
    }
}
