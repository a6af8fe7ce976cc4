//! The Ledger: genesis, recovery and the append protocol.
//!
//! The ledger owns the in-memory chain and keeps it in step with two
//! durable collaborators: the record store (one row per block) and the
//! snapshot store (the whole chain). An append is committed to memory only
//! after both have accepted it.
//!
//! Appends are serialized by a dedicated gate. The chain itself sits behind
//! a read-write lock that an append takes for writing only to attach the
//! already durable block, so queries never contend with the append gate.

use std::sync::Arc;

use filechain_core::{
    Block, BlockHash, BlockIndex, Chain, FileSize, TransferRecord, ValidationError,
};
use filechain_store::{
    LedgerRow, RecordStore, RecordStoreExt, RowScan, SnapshotError, SnapshotStore, LEDGER_SCHEMA,
};
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::config::{AppendPolicy, LedgerConfig};
use crate::error::{LedgerError, Result};

/// An initialized, append-only chain of file transfers.
///
/// Only [`Ledger::initialize`] constructs a ledger, so every ledger has a
/// genesis block and appends never run against an empty chain.
pub struct Ledger<R: RecordStore, P: SnapshotStore> {
    /// One row per block.
    rows: Arc<R>,
    /// Durable copy of the whole chain.
    snapshots: Arc<P>,
    /// Held for the whole of an append.
    append_gate: Mutex<()>,
    chain: RwLock<Chain>,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

impl<R: RecordStore, P: SnapshotStore> Ledger<R, P> {
    /// Open the ledger using the wall clock.
    ///
    /// See [`Ledger::initialize_with_clock`].
    pub async fn initialize(rows: Arc<R>, snapshots: Arc<P>, config: LedgerConfig) -> Result<Self> {
        Self::initialize_with_clock(rows, snapshots, config, Arc::new(SystemClock)).await
    }

    /// Open the ledger, creating the genesis block on first run.
    ///
    /// - A saved snapshot is loaded, verified and becomes the chain.
    /// - With no snapshot and no rows, a genesis block is created from
    ///   `config.genesis`, stored, and snapshotted.
    /// - With no snapshot but existing rows, the snapshot is missing and
    ///   this fails with [`SnapshotError::Missing`]. A second genesis block
    ///   is never created.
    pub async fn initialize_with_clock(
        rows: Arc<R>,
        snapshots: Arc<P>,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        rows.ensure_table(&LEDGER_SCHEMA).await?;
        let row_count = rows.row_count().await?;

        let chain = match snapshots.load_snapshot().await? {
            Some(snapshot) => {
                let chain = Chain::from_snapshot(snapshot)
                    .map_err(|e| SnapshotError::Corrupt(e.to_string()))?;

                tracing::info!(
                    blocks = chain.len(),
                    tip = %chain.current_block().hash(),
                    "recovered chain from snapshot"
                );
                if row_count != chain.len() as u64 {
                    tracing::warn!(
                        rows = row_count,
                        blocks = chain.len(),
                        "row count differs from chain length"
                    );
                }
                chain
            }
            None if row_count > 0 => {
                return Err(SnapshotError::Missing { rows: row_count }.into());
            }
            None => {
                let chain = Chain::new(config.genesis.clone(), clock.now());
                let genesis = chain.genesis_block();

                rows.insert_row(&LedgerRow::from_block(genesis)).await?;
                snapshots.save_snapshot(chain.as_snapshot()).await?;

                tracing::info!(
                    hash = %genesis.hash(),
                    file_name = %genesis.data().file_name,
                    "created genesis block"
                );
                chain
            }
        };

        Ok(Self {
            rows,
            snapshots,
            append_gate: Mutex::new(()),
            chain: RwLock::new(chain),
            config,
            clock,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Get the record store.
    pub fn record_store(&self) -> &Arc<R> {
        &self.rows
    }

    /// Get the snapshot store.
    pub fn snapshot_store(&self) -> &Arc<P> {
        &self.snapshots
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Append
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a transfer, returning the new block's hash.
    ///
    /// `file_size` may be an integer or a numeric string. Identical
    /// arguments always produce a new block.
    pub async fn append_block<F>(
        &self,
        file_name: impl Into<String>,
        sender_name: impl Into<String>,
        receiver_name: impl Into<String>,
        file_size: F,
    ) -> Result<BlockHash>
    where
        F: TryInto<FileSize, Error = ValidationError>,
    {
        let record = TransferRecord::try_new(file_name, sender_name, receiver_name, file_size)?;
        let block = self.append(record).await?;
        Ok(*block.hash())
    }

    /// Append a transfer record, returning the new tip.
    ///
    /// On any error the chain is left exactly as it was. If the row was
    /// stored but the snapshot write failed, the row stays in the table
    /// without a matching block; [`Ledger::audit`] reports it.
    pub async fn append(&self, record: TransferRecord) -> Result<Block> {
        let _gate = self.enter_append().await?;

        let chain = self.chain.read().await;
        let timestamp = self.clock.now();
        let tip = chain.current_block();
        if timestamp < tip.timestamp() {
            tracing::warn!(
                tip = %tip.index(),
                tip_timestamp = %tip.timestamp(),
                timestamp = %timestamp,
                "block timestamp precedes the current tip"
            );
        }

        let staged = chain.stage(chain.candidate(record, timestamp))?;

        self.rows.insert_row(&LedgerRow::from_block(staged.block())).await?;

        if let Err(err) = self.snapshots.save_snapshot(staged.as_snapshot()).await {
            tracing::warn!(
                index = %staged.block().index(),
                hash = %staged.block().hash(),
                error = %err,
                "row stored but snapshot not updated; chain unchanged"
            );
            return Err(err.into());
        }
        let block = staged.into_block();
        drop(chain);

        // The gate is still held, so the tip cannot have moved.
        self.chain.write().await.push(block.clone())?;

        tracing::debug!(
            index = %block.index(),
            hash = %block.hash(),
            file_name = %block.data().file_name,
            "appended block"
        );
        Ok(block)
    }

    async fn enter_append(&self) -> Result<MutexGuard<'_, ()>> {
        match self.config.append_policy {
            AppendPolicy::Queue => Ok(self.append_gate.lock().await),
            AppendPolicy::FailFast => self
                .append_gate
                .try_lock()
                .map_err(|_| LedgerError::Concurrency),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of blocks, genesis included.
    pub async fn len(&self) -> usize {
        self.chain.read().await.len()
    }

    /// The genesis block.
    pub async fn genesis(&self) -> Block {
        self.chain.read().await.genesis_block().clone()
    }

    /// The current tip.
    pub async fn tip(&self) -> Block {
        self.chain.read().await.current_block().clone()
    }

    /// Get a block by index.
    pub async fn block(&self, index: BlockIndex) -> Option<Block> {
        self.chain.read().await.get(index).cloned()
    }

    /// All blocks, genesis first.
    pub async fn blocks(&self) -> Vec<Block> {
        self.chain.read().await.blocks().to_vec()
    }

    /// Block hashes, genesis first.
    pub async fn hash_sequence(&self) -> Vec<BlockHash> {
        self.chain.read().await.hashes()
    }

    /// A copy of the whole chain.
    pub async fn chain(&self) -> Chain {
        self.chain.read().await.clone()
    }

    /// Lazy scan over the stored rows, in insertion order.
    pub fn scan(&self) -> RowScan<'_, R> {
        self.rows.scan_with_page_size(self.config.scan_page_size)
    }

    /// All stored rows, in insertion order.
    pub async fn rows(&self) -> Result<Vec<LedgerRow>> {
        Ok(self.scan().collect_rows().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use filechain_core::{verify_blocks, Timestamp};
    use filechain_store::{MemoryStore, RowId, StoreError, TableSchema};
    use tokio::sync::Notify;

    const T0: u64 = 1_736_870_400_000_000;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Timestamp::from_micros(T0), 1_000_000))
    }

    async fn open(
        store: &Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    ) -> Result<Ledger<MemoryStore, MemoryStore>> {
        Ledger::initialize_with_clock(store.clone(), store.clone(), LedgerConfig::default(), clock)
            .await
    }

    /// Row store whose inserts park until released, once armed.
    #[derive(Default)]
    struct ParkedRows {
        inner: MemoryStore,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl RecordStore for ParkedRows {
        async fn ensure_table(&self, schema: &TableSchema) -> filechain_store::Result<()> {
            self.inner.ensure_table(schema).await
        }

        async fn insert_row(&self, row: &LedgerRow) -> filechain_store::Result<RowId> {
            if self.armed.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.insert_row(row).await
        }

        async fn scan_page(
            &self,
            after: Option<RowId>,
            limit: usize,
        ) -> filechain_store::Result<Vec<(RowId, LedgerRow)>> {
            self.inner.scan_page(after, limit).await
        }

        async fn row_count(&self) -> filechain_store::Result<u64> {
            self.inner.row_count().await
        }
    }

    async fn fail_fast_parked() -> (Arc<Ledger<ParkedRows, MemoryStore>>, Arc<ParkedRows>) {
        let rows = Arc::new(ParkedRows::default());
        let ledger = Ledger::initialize_with_clock(
            rows.clone(),
            Arc::new(MemoryStore::new()),
            LedgerConfig::default().with_append_policy(AppendPolicy::FailFast),
            clock(),
        )
        .await
        .unwrap();
        (Arc::new(ledger), rows)
    }

    #[tokio::test]
    async fn test_first_run_creates_genesis() {
        let store = Arc::new(MemoryStore::new());
        let ledger = open(&store, clock()).await.unwrap();

        assert_eq!(ledger.len().await, 1);
        let genesis = ledger.genesis().await;
        assert!(genesis.is_genesis());
        assert_eq!(genesis.timestamp(), Timestamp::from_micros(T0));
        assert_eq!(
            genesis.hash().to_hex(),
            "f43f24a388e2edf28c5fde7f67c757f45720e47355408058fa77db7ec16bee98\
             14fd8bd0e57e215d8b30fc98614229a336cb8a430bce5b22838ed0c61b5c9206"
        );
        assert_eq!(store.row_count().await.unwrap(), 1);
        assert!(store.snapshot_bytes().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_append_links_to_tip() {
        let store = Arc::new(MemoryStore::new());
        let ledger = open(&store, clock()).await.unwrap();

        let h1 = ledger.append_block("report.pdf", "alice", "bob", 2048u64).await.unwrap();
        let h2 = ledger.append_block("report.pdf", "alice", "bob", "2048").await.unwrap();
        assert_ne!(h1, h2);

        let blocks = ledger.blocks().await;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].prev_hash(), Some(blocks[0].hash()));
        assert_eq!(blocks[2].prev_hash(), Some(&h1));
        assert_eq!(blocks[1].next_block(), Some(BlockIndex(2)));
        assert_eq!(blocks[2].next_block(), None);
        verify_blocks(&blocks).unwrap();

        let rows = ledger.rows().await.unwrap();
        let row_hashes: Vec<BlockHash> = rows.iter().map(|r| r.hash).collect();
        assert_eq!(row_hashes, ledger.hash_sequence().await);
    }

    #[tokio::test]
    async fn test_invalid_file_size_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ledger = open(&store, clock()).await.unwrap();

        let err = ledger.append_block("a", "b", "c", "12kb").await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        let err = ledger.append_block("a", "b", "c", -4i64).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        assert_eq!(ledger.len().await, 1);
        assert_eq!(store.row_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_failure_leaves_chain_unchanged() {
        let store = Arc::new(MemoryStore::new());
        let ledger = open(&store, clock()).await.unwrap();
        let before = ledger.chain().await;

        let err = ledger
            .append_block("huge.iso", "a", "b", u64::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::Integrity(_))));
        assert_eq!(ledger.chain().await, before);
        assert_eq!(store.row_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_failure_orphans_row_only() {
        let store = Arc::new(MemoryStore::new());
        let ledger = open(&store, clock()).await.unwrap();
        let before = ledger.chain().await;

        store.fail_snapshot_writes(true).unwrap();
        let err = ledger.append_block("a", "b", "c", 1u64).await.unwrap_err();
        assert!(matches!(err.as_snapshot_error(), Some(SnapshotError::Write(_))));

        assert_eq!(ledger.chain().await, before);
        assert_eq!(store.row_count().await.unwrap(), 2);

        // The next successful append still extends the snapshotted tip.
        store.fail_snapshot_writes(false).unwrap();
        let block = ledger
            .append(TransferRecord::new("a", "b", "c", FileSize::new(1)))
            .await
            .unwrap();
        assert_eq!(block.index(), BlockIndex(1));
        assert_eq!(block.prev_hash(), Some(before.current_block().hash()));
    }

    #[tokio::test]
    async fn test_timestamp_regression_is_accepted() {
        let store = Arc::new(MemoryStore::new());
        let clock = clock();
        let ledger = open(&store, clock.clone()).await.unwrap();

        clock.set(Timestamp::from_micros(T0 - 5_000_000));
        let block = ledger
            .append(TransferRecord::new("a", "b", "c", FileSize::ZERO))
            .await
            .unwrap();
        assert!(block.timestamp() < ledger.genesis().await.timestamp());
        verify_blocks(&ledger.blocks().await).unwrap();
    }

    #[tokio::test]
    async fn test_fail_fast_rejects_second_append_in_flight() {
        let (ledger, rows) = fail_fast_parked().await;
        rows.armed.store(true, Ordering::SeqCst);

        let first = tokio::spawn({
            let ledger = ledger.clone();
            async move { ledger.append_block("a", "b", "c", 1u64).await }
        });
        rows.entered.notified().await;

        // Queries are served while the first append is parked in storage.
        assert_eq!(ledger.len().await, 1);
        assert!(ledger.audit().await.unwrap().is_clean());

        let err = ledger.append_block("x", "y", "z", 2u64).await.unwrap_err();
        assert!(matches!(err, LedgerError::Concurrency));

        rows.armed.store(false, Ordering::SeqCst);
        rows.release.notify_one();
        let hash = first.await.unwrap().unwrap();
        assert_eq!(ledger.tip().await.hash(), &hash);

        ledger.append_block("x", "y", "z", 2u64).await.unwrap();
        assert_eq!(ledger.len().await, 3);
    }

    #[tokio::test]
    async fn test_fail_fast_ignores_readers() {
        let (ledger, _rows) = fail_fast_parked().await;

        let view = ledger.chain.read().await;
        let append = tokio::spawn({
            let ledger = ledger.clone();
            async move { ledger.append_block("a", "b", "c", 1u64).await }
        });
        tokio::task::yield_now().await;
        assert_eq!(view.len(), 1);
        drop(view);

        append.await.unwrap().unwrap();
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn test_block_query() {
        let store = Arc::new(MemoryStore::new());
        let ledger = open(&store, clock()).await.unwrap();
        let hash = ledger.append_block("a", "b", "c", 9u64).await.unwrap();

        assert_eq!(ledger.block(BlockIndex(1)).await.unwrap().hash(), &hash);
        assert_eq!(ledger.tip().await.hash(), &hash);
        assert!(ledger.block(BlockIndex(2)).await.is_none());
    }
}
