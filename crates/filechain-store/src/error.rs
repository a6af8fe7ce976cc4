//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during record store and snapshot operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The existing table does not have the declared ledger shape.
    #[error("schema mismatch in table {table}: expected {expected}, found {found}")]
    Schema {
        table: String,
        expected: String,
        found: String,
    },

    /// A row violates storage constraints.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Invalid data read back from storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Chain-state snapshot error.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors specific to the durable chain-state snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No snapshot exists although the record store already holds rows.
    #[error("snapshot missing while record store holds {rows} row(s)")]
    Missing { rows: u64 },

    /// The snapshot exists but could not be read.
    #[error("snapshot unreadable: {0}")]
    Unreadable(String),

    /// The snapshot was read but does not decode to a valid chain.
    #[error("snapshot corrupt: {0}")]
    Corrupt(String),

    /// The snapshot could not be written.
    #[error("snapshot write failed: {0}")]
    Write(String),
}

impl StoreError {
    /// A poisoned lock guarding storage state.
    pub(crate) fn poisoned(what: impl std::fmt::Display) -> Self {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", what)),
        ))
    }

    /// A blocking task that panicked or was cancelled.
    pub(crate) fn task_failed(what: impl std::fmt::Display) -> Self {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("spawn_blocking failed: {}", what)),
        ))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
