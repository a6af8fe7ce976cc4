//! Error types for the ledger.

use std::path::PathBuf;

use filechain_core::{ChainError, ValidationError};
use filechain_store::{SnapshotError, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The in-memory chain rejected a block.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Another append holds the chain and the policy is fail-fast.
    #[error("another append is in progress")]
    Concurrency,

    /// Storage already exists and the open policy forbids reusing it.
    #[error("storage already exists: {0}")]
    StorageExists(PathBuf),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<SnapshotError> for LedgerError {
    fn from(err: SnapshotError) -> Self {
        LedgerError::Store(StoreError::Snapshot(err))
    }
}

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Schema,
    Integrity,
    Snapshot,
    Concurrency,
    Storage,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) | LedgerError::Config(_) => ErrorKind::Validation,
            LedgerError::Chain(_) => ErrorKind::Integrity,
            LedgerError::Store(err) => match err {
                StoreError::Schema { .. } => ErrorKind::Schema,
                StoreError::Integrity(_) | StoreError::InvalidData(_) => ErrorKind::Integrity,
                StoreError::Snapshot(_) => ErrorKind::Snapshot,
                StoreError::Database(_) | StoreError::Migration(_) | StoreError::Io(_) => {
                    ErrorKind::Storage
                }
            },
            LedgerError::Concurrency => ErrorKind::Concurrency,
            LedgerError::StorageExists(_) => ErrorKind::Storage,
        }
    }

    /// The snapshot error underneath, if this is one.
    pub fn as_snapshot_error(&self) -> Option<&SnapshotError> {
        match self {
            LedgerError::Store(StoreError::Snapshot(err)) => Some(err),
            _ => None,
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
