//! Storage traits and error types
//!
//! This module defines the trait interface of the dataset store and
//! associated error types.

use crate::storage::{RunRecord, RunStatus};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for dataset store implementations
///
/// A store keeps three things: a log of runs, an append-only list of JSON
/// items per run, and named JSON records.
pub trait ResultStore {
    // ===== Run Management =====

    /// Creates a new run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `author_url` - The author being scraped
    /// * `config_hash` - Fingerprint of the effective configuration
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, author_url: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets up to `limit` runs, newest first
    fn latest_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    /// Sets the final status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Dataset =====

    /// Appends an item to a run's dataset, returning the item ID
    fn push_item(&mut self, run_id: i64, item: &Value) -> StorageResult<i64>;

    /// Gets a run's items in insertion order
    fn items(&self, run_id: i64) -> StorageResult<Vec<Value>>;

    // ===== Key-Value Records =====

    /// Stores a named record, replacing any previous value
    fn set_value(&mut self, key: &str, value: &Value) -> StorageResult<()>;

    /// Gets a named record
    fn get_value(&self, key: &str) -> StorageResult<Option<Value>>;
}
