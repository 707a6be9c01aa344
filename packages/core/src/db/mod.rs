//! Database Layer
//!
//! Document persistence on libsql:
//!
//! - [`DatabaseService`]: connection management and the SQL for the `documents` table
//! - [`DocumentStore`]: async repository trait used by editing sessions
//! - [`TursoStore`]: `DocumentStore` over a `DatabaseService`
//!
//! The backend (embedded file, in-memory, remote server) is chosen by
//! [`StorageConfig`](crate::config::StorageConfig).

mod database;
mod document_store;
mod error;
mod turso_store;

pub use database::{DatabaseService, DbDocumentParams};
pub use document_store::DocumentStore;
pub use error::DatabaseError;
pub use turso_store::TursoStore;
