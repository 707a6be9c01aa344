//! Database Error Types
//!
//! Error types for the libsql layer: connection, initialization and query
//! failures.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Database operation errors
///
/// Covers connection, initialization and SQL failures. Conversion of rows into
/// documents is reported by the repository layer (see `TursoStore`).
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open the database
    #[error("Failed to connect to {location}: {source}")]
    ConnectionFailed {
        location: String,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Database path points at something that cannot hold a database file
    #[error("Invalid database path: {path}")]
    InvalidPath { path: PathBuf },

    /// Permission denied when accessing database
    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// Storage configuration could not be read
    #[error("Invalid storage configuration: {0}")]
    Config(#[from] ConfigError),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },
}

impl DatabaseError {
    /// Create a connection failed error
    pub fn connection_failed(location: impl Into<String>, source: libsql::Error) -> Self {
        Self::ConnectionFailed {
            location: location.into(),
            source,
        }
    }

    /// Create an initialization failed error
    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create an invalid path error
    pub fn invalid_path(path: PathBuf) -> Self {
        Self::InvalidPath { path }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }
}
