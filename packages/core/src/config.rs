//! Storage configuration
//!
//! Selects where documents are persisted, from environment variables:
//!
//! - `OUTLINE_DB_URL` (and optionally `OUTLINE_DB_AUTH_TOKEN`): remote libsql
//!   row-store, e.g. `libsql://my-db.turso.io`
//! - `OUTLINE_DB_PATH`: local database file; `:memory:` keeps everything in memory
//! - otherwise `~/.outline/database/outline.db`
//!
//! A remote URL wins over a local path when both are set.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DB_URL: &str = "OUTLINE_DB_URL";
pub const ENV_DB_AUTH_TOKEN: &str = "OUTLINE_DB_AUTH_TOKEN";
pub const ENV_DB_PATH: &str = "OUTLINE_DB_PATH";

/// Path value selecting an in-memory database
pub const MEMORY_PATH: &str = ":memory:";

const REMOTE_SCHEMES: [&str; 5] = ["libsql://", "https://", "http://", "wss://", "ws://"];

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported database URL '{url}': expected a libsql://, https:// or ws:// URL")]
    UnsupportedUrl { url: String },

    #[error("Cannot determine home directory for the default database path")]
    NoHomeDirectory,
}

/// Where documents are stored
#[derive(Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Embedded database file
    Local { path: PathBuf },
    /// Embedded database that lives only as long as the process
    Memory,
    /// Remote libsql server
    Remote {
        url: String,
        auth_token: Option<String>,
    },
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => f.debug_struct("Local").field("path", path).finish(),
            Self::Memory => f.write_str("Memory"),
            Self::Remote { url, auth_token } => f
                .debug_struct("Remote")
                .field("url", url)
                .field("auth_token", &auth_token.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

impl fmt::Display for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => write!(f, "local database at {}", path.display()),
            Self::Memory => f.write_str("in-memory database"),
            Self::Remote { url, .. } => write!(f, "remote database at {}", url),
        }
    }
}

impl StorageConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup` instead of the process environment
    ///
    /// ```rust
    /// use outline_core::config::StorageConfig;
    ///
    /// let config = StorageConfig::from_lookup(|key| match key {
    ///     "OUTLINE_DB_PATH" => Some(":memory:".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config, StorageConfig::Memory);
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = non_empty(ENV_DB_URL) {
            if !REMOTE_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
                return Err(ConfigError::UnsupportedUrl { url });
            }
            tracing::info!("Using remote database from {}", ENV_DB_URL);
            return Ok(Self::Remote {
                url,
                auth_token: non_empty(ENV_DB_AUTH_TOKEN),
            });
        }

        if let Some(path) = non_empty(ENV_DB_PATH) {
            tracing::info!("Using database path from {}: {}", ENV_DB_PATH, path);
            if path == MEMORY_PATH {
                return Ok(Self::Memory);
            }
            return Ok(Self::Local {
                path: PathBuf::from(path),
            });
        }

        default_database_path()
            .map(|path| Self::Local { path })
            .ok_or(ConfigError::NoHomeDirectory)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

/// `~/.outline/database/outline.db`, or `None` without a home directory
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".outline").join("database").join("outline.db"))
}
