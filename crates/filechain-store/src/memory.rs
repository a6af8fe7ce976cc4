//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite plus
//! a file snapshot, but keeps everything in memory with no persistence.
//! Sharing one `Arc<MemoryStore>` between ledger instances simulates a
//! process restart.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use filechain_core::{ChainSnapshot, SnapshotRef};

use crate::error::{Result, SnapshotError, StoreError};
use crate::row::{describe_columns, LedgerRow, RowId, TableSchema, LEDGER_SCHEMA};
use crate::snapshot::{decode_snapshot, encode_snapshot};
use crate::traits::{RecordStore, SnapshotStore};

/// In-memory record and snapshot store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Table created by `ensure_table`, if any.
    table: Option<TableSchema>,

    /// Rows in insertion order. `RowId(n)` lives at `rows[n - 1]`.
    rows: Vec<LedgerRow>,

    /// Encoded snapshot, exactly as a file store would hold it.
    snapshot: Option<Vec<u8>>,

    /// Test switch: reject snapshot writes.
    fail_snapshot_writes: bool,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(StoreError::poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(StoreError::poisoned)
    }

    /// Raw snapshot bytes, if a snapshot has been saved.
    pub fn snapshot_bytes(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.read()?.snapshot.clone())
    }

    /// Overwrite the stored snapshot with arbitrary bytes.
    pub fn set_snapshot_bytes(&self, bytes: Vec<u8>) -> Result<()> {
        self.write()?.snapshot = Some(bytes);
        Ok(())
    }

    /// Remove the snapshot while keeping every row.
    pub fn delete_snapshot(&self) -> Result<()> {
        self.write()?.snapshot = None;
        Ok(())
    }

    /// Make every subsequent `save_snapshot` fail with a write error.
    pub fn fail_snapshot_writes(&self, fail: bool) -> Result<()> {
        self.write()?.fail_snapshot_writes = fail;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ensure_table(&self, schema: &TableSchema) -> Result<()> {
        let mut inner = self.write()?;

        match inner.table {
            None => {
                inner.table = Some(*schema);
                Ok(())
            }
            Some(existing)
                if existing.name == schema.name && existing.columns == schema.columns =>
            {
                Ok(())
            }
            Some(existing) => Err(StoreError::Schema {
                table: schema.name.to_string(),
                expected: schema.describe(),
                found: describe_columns(existing.columns.iter().map(|c| (c.name, c.sql_type))),
            }),
        }
    }

    async fn insert_row(&self, row: &LedgerRow) -> Result<RowId> {
        // Same coercion rules as the SQLite binding.
        row.column_values()?;

        let mut inner = self.write()?;
        if inner.table.is_none() {
            return Err(StoreError::Schema {
                table: LEDGER_SCHEMA.name.to_string(),
                expected: LEDGER_SCHEMA.describe(),
                found: "(no table)".to_string(),
            });
        }

        inner.rows.push(row.clone());
        Ok(RowId(inner.rows.len() as i64))
    }

    async fn scan_page(
        &self,
        after: Option<RowId>,
        limit: usize,
    ) -> Result<Vec<(RowId, LedgerRow)>> {
        let inner = self.read()?;
        let start = after.map_or(0, |id| id.0.max(0) as usize);

        Ok(inner
            .rows
            .iter()
            .enumerate()
            .skip(start)
            .take(limit)
            .map(|(i, row)| (RowId(i as i64 + 1), row.clone()))
            .collect())
    }

    async fn row_count(&self) -> Result<u64> {
        Ok(self.read()?.rows.len() as u64)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load_snapshot(&self) -> Result<Option<ChainSnapshot>> {
        let inner = self.read()?;
        inner.snapshot.as_deref().map(decode_snapshot).transpose()
    }

    async fn save_snapshot(&self, snapshot: SnapshotRef<'_>) -> Result<()> {
        let bytes = encode_snapshot(snapshot)?;

        let mut inner = self.write()?;
        if inner.fail_snapshot_writes {
            return Err(SnapshotError::Write("snapshot writes disabled".into()).into());
        }
        inner.snapshot = Some(bytes);
        Ok(())
    }
}
