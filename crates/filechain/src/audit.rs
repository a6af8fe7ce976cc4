//! Read-only re-verification of the stored rows.
//!
//! The audit walks the table in insertion order, matching rows to chain
//! blocks by hash. A row that is a well-formed successor of the last
//! matched row but is not in the chain is an orphan, left behind by an
//! append whose snapshot write failed; it is reported once and skipped, so
//! the rows after it are still checked against their blocks. The audit
//! never runs on the append path and never writes.

use filechain_core::{block_hash, BlockHash, BlockIndex, Chain};
use filechain_store::{LedgerRow, RecordStore, SnapshotStore};

use crate::error::Result;
use crate::ledger::Ledger;

/// A single finding of an audit. `position` is the row's ordinal in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditIssue {
    /// The stored hash does not match the row contents chained onto the
    /// last matched row.
    HashMismatch {
        position: u64,
        stored: BlockHash,
        recomputed: BlockHash,
    },
    /// The row carries a block's hash but differs from that block.
    BlockMismatch { position: u64 },
    /// A well-formed row that no chain block accounts for.
    UnexpectedRow { position: u64, hash: BlockHash },
    /// Fewer rows matched than the chain has blocks.
    MissingRows { matched: u64, blocks: u64 },
}

/// Outcome of [`Ledger::audit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub rows_checked: u64,
    pub blocks: u64,
    pub issues: Vec<AuditIssue>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl<R: RecordStore, P: SnapshotStore> Ledger<R, P> {
    /// Re-verify every stored row against its predecessor and the chain.
    pub async fn audit(&self) -> Result<AuditReport> {
        let chain = self.chain().await;
        let mut auditor = Auditor::new(&chain);

        let mut scan = self.scan();
        while let Some(row) = scan.next().await? {
            auditor.check(&row);
        }
        let report = auditor.finish();

        if report.is_clean() {
            tracing::debug!(rows = report.rows_checked, "audit clean");
        } else {
            tracing::warn!(
                rows = report.rows_checked,
                issues = report.issues.len(),
                "audit found inconsistencies"
            );
        }
        Ok(report)
    }
}

/// Walks rows in insertion order against a chain.
struct Auditor<'a> {
    chain: &'a Chain,
    /// Index of the next block a row should match.
    next_block: u64,
    /// Hash of the last row that matched a block.
    prev: Option<BlockHash>,
    rows: u64,
    issues: Vec<AuditIssue>,
}

impl<'a> Auditor<'a> {
    fn new(chain: &'a Chain) -> Self {
        Self {
            chain,
            next_block: 0,
            prev: None,
            rows: 0,
            issues: Vec::new(),
        }
    }

    fn check(&mut self, row: &LedgerRow) {
        let position = self.rows;
        self.rows += 1;

        let recomputed = block_hash(row.timestamp, &row.transfer(), self.prev.as_ref());
        let expected = self.chain.get(BlockIndex(self.next_block));

        match expected {
            Some(block) if block.hash() == &row.hash => {
                if recomputed != row.hash {
                    self.issues.push(AuditIssue::HashMismatch {
                        position,
                        stored: row.hash,
                        recomputed,
                    });
                }
                if LedgerRow::from_block(block) != *row {
                    self.issues.push(AuditIssue::BlockMismatch { position });
                }
                self.prev = Some(row.hash);
                self.next_block += 1;
            }
            // Not the expected block: do not advance, so later rows still
            // line up with the chain.
            _ if recomputed == row.hash => self.issues.push(AuditIssue::UnexpectedRow {
                position,
                hash: row.hash,
            }),
            _ => self.issues.push(AuditIssue::HashMismatch {
                position,
                stored: row.hash,
                recomputed,
            }),
        }
    }

    fn finish(mut self) -> AuditReport {
        let blocks = self.chain.len() as u64;
        if self.next_block < blocks {
            self.issues.push(AuditIssue::MissingRows {
                matched: self.next_block,
                blocks,
            });
        }
        AuditReport {
            rows_checked: self.rows,
            blocks,
            issues: self.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LedgerConfig;
    use filechain_core::{FileSize, Timestamp};
    use filechain_store::MemoryStore;

    async fn ledger_with(
        store: &Arc<MemoryStore>,
        appends: u64,
    ) -> Ledger<MemoryStore, MemoryStore> {
        let clock = Arc::new(ManualClock::new(Timestamp::from_micros(1_000_000), 1_000));
        let ledger = Ledger::initialize_with_clock(
            store.clone(),
            store.clone(),
            LedgerConfig::default(),
            clock,
        )
        .await
        .unwrap();
        for i in 0..appends {
            ledger.append_block("f", "s", "r", i).await.unwrap();
        }
        ledger
    }

    #[tokio::test]
    async fn test_clean_ledger() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_with(&store, 4).await;

        let report = ledger.audit().await.unwrap();
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.rows_checked, 5);
        assert_eq!(report.blocks, 5);
    }

    #[tokio::test]
    async fn test_orphan_row_reported() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_with(&store, 1).await;

        store.fail_snapshot_writes(true).unwrap();
        ledger.append_block("f", "s", "r", 7u64).await.unwrap_err();

        let report = ledger.audit().await.unwrap();
        assert_eq!(report.rows_checked, 3);
        assert!(matches!(
            report.issues.as_slice(),
            [AuditIssue::UnexpectedRow { position: 2, .. }]
        ));
    }

    #[tokio::test]
    async fn test_orphan_does_not_taint_later_blocks() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_with(&store, 1).await;

        store.fail_snapshot_writes(true).unwrap();
        ledger.append_block("f", "s", "r", 7u64).await.unwrap_err();
        let orphan = ledger.rows().await.unwrap().pop().unwrap();
        store.fail_snapshot_writes(false).unwrap();

        for i in 0..3u64 {
            ledger.append_block("g", "s", "r", i).await.unwrap();
        }

        let report = ledger.audit().await.unwrap();
        assert_eq!(report.rows_checked, 6);
        assert_eq!(report.blocks, 5);
        assert_eq!(
            report.issues,
            vec![AuditIssue::UnexpectedRow {
                position: 2,
                hash: orphan.hash,
            }]
        );
    }

    #[tokio::test]
    async fn test_tampered_row_reported() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_with(&store, 2).await;

        let mut rows = ledger.rows().await.unwrap();
        rows[2].file_size = FileSize::new(999);

        let chain = ledger.chain().await;
        let mut auditor = Auditor::new(&chain);
        for row in &rows {
            auditor.check(row);
        }
        let report = auditor.finish();

        assert!(matches!(report.issues[0], AuditIssue::HashMismatch { position: 2, .. }));
        assert_eq!(report.issues[1], AuditIssue::BlockMismatch { position: 2 });
        assert_eq!(report.issues.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_rows_reported() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_with(&store, 3).await;

        let rows = ledger.rows().await.unwrap();
        let chain = ledger.chain().await;
        let mut auditor = Auditor::new(&chain);
        for row in &rows[..2] {
            auditor.check(row);
        }

        assert_eq!(
            auditor.finish().issues,
            vec![AuditIssue::MissingRows { matched: 2, blocks: 4 }]
        );
    }
}
