//! Store traits: the abstract interfaces for row and snapshot persistence.
//!
//! These traits keep the ledger storage-agnostic. Implementations include
//! SQLite (primary), a file-backed snapshot store, and in-memory (for tests).

use std::collections::VecDeque;

use async_trait::async_trait;
use filechain_core::{ChainSnapshot, SnapshotRef};

use crate::error::Result;
use crate::row::{LedgerRow, RowId, TableSchema};

/// Rows fetched per page when scanning, unless overridden.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 256;

/// The RecordStore trait: async interface for the append-only ledger table.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Append-only**: there is no update or delete.
/// - **Insertion order**: row ids increase with every insert, and scans
///   return rows in row-id order.
/// - **Typed rows**: inserts and scans always carry [`LedgerRow`]s.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the table if absent and verify the shape of an existing one.
    ///
    /// Idempotent. Fails with [`StoreError::Schema`](crate::StoreError::Schema)
    /// when an existing table has different columns.
    async fn ensure_table(&self, schema: &TableSchema) -> Result<()>;

    /// Append one row, returning its storage-assigned id.
    async fn insert_row(&self, row: &LedgerRow) -> Result<RowId>;

    /// Fetch up to `limit` rows with ids strictly greater than `after`.
    ///
    /// `None` starts from the first row. Rows are ordered by id.
    async fn scan_page(&self, after: Option<RowId>, limit: usize)
        -> Result<Vec<(RowId, LedgerRow)>>;

    /// Number of rows in the table.
    async fn row_count(&self) -> Result<u64>;
}

/// The SnapshotStore trait: durable home of the serialized chain.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot.
    ///
    /// Returns `None` only when no snapshot has ever been saved.
    async fn load_snapshot(&self) -> Result<Option<ChainSnapshot>>;

    /// Replace the snapshot with the given chain view, atomically.
    async fn save_snapshot(&self, snapshot: SnapshotRef<'_>) -> Result<()>;
}

/// Extension trait for scanning a record store.
pub trait RecordStoreExt: RecordStore {
    /// Start a lazy scan over all rows, in insertion order.
    fn scan(&self) -> RowScan<'_, Self> {
        self.scan_with_page_size(DEFAULT_SCAN_PAGE_SIZE)
    }

    /// Like [`scan`](Self::scan) with an explicit page size.
    fn scan_with_page_size(&self, page_size: usize) -> RowScan<'_, Self> {
        RowScan::new(self, page_size)
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}

/// A lazy, finite cursor over the rows of a [`RecordStore`].
///
/// Pages are fetched on demand. Every call to [`RecordStoreExt::scan`]
/// returns an independent cursor starting from the first row, so a scan is
/// restartable by simply creating a new one.
pub struct RowScan<'a, S: ?Sized> {
    store: &'a S,
    page_size: usize,
    last: Option<RowId>,
    buffered: VecDeque<(RowId, LedgerRow)>,
    exhausted: bool,
}

impl<'a, S: RecordStore + ?Sized> RowScan<'a, S> {
    fn new(store: &'a S, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            last: None,
            buffered: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Next row with its id, or `None` once the table is exhausted.
    pub async fn next_entry(&mut self) -> Result<Option<(RowId, LedgerRow)>> {
        if self.buffered.is_empty() && !self.exhausted {
            let page = self.store.scan_page(self.last, self.page_size).await?;
            if page.len() < self.page_size {
                self.exhausted = true;
            }
            if let Some((id, _)) = page.last() {
                self.last = Some(*id);
            }
            self.buffered.extend(page);
        }

        Ok(self.buffered.pop_front())
    }

    /// Next row, or `None` once the table is exhausted.
    pub async fn next(&mut self) -> Result<Option<LedgerRow>> {
        Ok(self.next_entry().await?.map(|(_, row)| row))
    }

    /// Drain the remaining rows into a vector.
    pub async fn collect_rows(mut self) -> Result<Vec<LedgerRow>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}
