//! Storage module for persisting run results
//!
//! This module handles all database operations of the dataset store:
//! - SQLite database initialization and schema management
//! - Run bookkeeping (author, config fingerprint, status)
//! - Per-run dataset items
//! - Named key-value records

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ResultStore, StorageError, StorageResult};

use std::path::Path;

/// Key of the record holding the last run's payload
pub const OUTPUT_KEY: &str = "OUTPUT";

/// Initializes or opens a dataset store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(StorageError)` - Failed to initialize store
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// Represents a scrape run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub author_url: String,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    /// Finished, but some data is missing
    Partial,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Final status of a run that returned a result
    pub fn for_result(partial: bool) -> Self {
        if partial {
            Self::Partial
        } else {
            Self::Completed
        }
    }
}
