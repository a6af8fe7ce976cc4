//! Opening the ledger on SQLite and a snapshot file.

use std::io;
use std::path::Path;
use std::sync::Arc;

use filechain_store::{FileSnapshotStore, SqliteStore, StoreError};

use crate::clock::{Clock, SystemClock};
use crate::config::{ExistingStorage, LedgerConfig};
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;

/// A ledger backed by SQLite rows and a snapshot file.
pub type SqliteLedger = Ledger<SqliteStore, FileSnapshotStore>;

/// Open the ledger at `config.db_path` and `config.snapshot_path`.
///
/// `config.on_existing` decides what happens when either file exists.
pub async fn open_sqlite(config: LedgerConfig) -> Result<SqliteLedger> {
    open_sqlite_with_clock(config, Arc::new(SystemClock)).await
}

pub async fn open_sqlite_with_clock(
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
) -> Result<SqliteLedger> {
    config.validate()?;
    prepare_storage(&config)?;

    let rows = SqliteStore::open(&config.db_path)?;
    let snapshots = FileSnapshotStore::new(&config.snapshot_path);

    Ledger::initialize_with_clock(Arc::new(rows), Arc::new(snapshots), config, clock).await
}

fn prepare_storage(config: &LedgerConfig) -> Result<()> {
    let existing: Vec<&Path> = [config.db_path.as_path(), config.snapshot_path.as_path()]
        .into_iter()
        .filter(|p| p.exists())
        .collect();

    let Some(first) = existing.first() else {
        return Ok(());
    };

    match config.on_existing {
        ExistingStorage::Reuse => Ok(()),
        ExistingStorage::Fail => Err(LedgerError::StorageExists(first.to_path_buf())),
        ExistingStorage::Overwrite => {
            for path in &existing {
                tracing::warn!(path = %path.display(), "deleting existing ledger storage");
                remove_if_present(path)?;
            }
            Ok(())
        }
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::Io(e).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reuse_resumes_chain() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::in_dir(dir.path());

        let hash = {
            let ledger = open_sqlite(config.clone()).await.unwrap();
            ledger.append_block("a", "b", "c", 1u64).await.unwrap()
        };

        let ledger = open_sqlite(config).await.unwrap();
        assert_eq!(ledger.len().await, 2);
        assert_eq!(ledger.tip().await.hash(), &hash);
    }

    #[tokio::test]
    async fn test_fail_policy_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::in_dir(dir.path());
        drop(open_sqlite(config.clone()).await.unwrap());

        let err = open_sqlite(config.with_on_existing(ExistingStorage::Fail))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, LedgerError::StorageExists(_)));
    }

    #[tokio::test]
    async fn test_fail_policy_allows_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::in_dir(dir.path()).with_on_existing(ExistingStorage::Fail);
        let ledger = open_sqlite(config).await.unwrap();
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_overwrite_starts_new_chain() {
        let dir = tempfile::tempdir().unwrap();
        let config = LedgerConfig::in_dir(dir.path());
        {
            let ledger = open_sqlite(config.clone()).await.unwrap();
            ledger.append_block("a", "b", "c", 1u64).await.unwrap();
            ledger.append_block("a", "b", "c", 2u64).await.unwrap();
        }

        let ledger = open_sqlite(config.with_on_existing(ExistingStorage::Overwrite))
            .await
            .unwrap();
        assert_eq!(ledger.len().await, 1);
        assert_eq!(ledger.rows().await.unwrap().len(), 1);
    }
}
