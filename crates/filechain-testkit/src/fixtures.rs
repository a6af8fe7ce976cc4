//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use filechain::{Ledger, LedgerConfig, ManualClock, Result};
use filechain_core::{FileSize, Timestamp, TransferRecord};
use filechain_store::MemoryStore;

/// First timestamp handed out by a fixture clock (2025-01-14T16:00:00Z).
pub const FIXTURE_START: Timestamp = Timestamp::from_micros(1_736_870_400_000_000);

/// Fixture clock step: one second.
pub const FIXTURE_STEP_MICROS: u64 = 1_000_000;

/// A ledger on in-memory storage with a deterministic clock.
///
/// `store` backs both rows and snapshot, so [`TestLedger::restart`] behaves
/// like a process restart against the same storage.
pub struct TestLedger {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub config: LedgerConfig,
    pub ledger: Ledger<MemoryStore, MemoryStore>,
}

impl TestLedger {
    /// Fresh storage, default configuration.
    pub async fn new() -> Result<Self> {
        Self::with_config(LedgerConfig::default()).await
    }

    /// Fresh storage with the given configuration.
    pub async fn with_config(config: LedgerConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(FIXTURE_START, FIXTURE_STEP_MICROS));
        let ledger = open(&store, &clock, &config).await?;

        Ok(Self {
            store,
            clock,
            config,
            ledger,
        })
    }

    /// Drop the ledger and initialize a new one on the same storage and clock.
    pub async fn restart(&mut self) -> Result<()> {
        self.ledger = open(&self.store, &self.clock, &self.config).await?;
        Ok(())
    }

    /// Initialize another ledger on the same storage without replacing this one.
    pub async fn reopen(&self) -> Result<Ledger<MemoryStore, MemoryStore>> {
        open(&self.store, &self.clock, &self.config).await
    }

    /// Append `n` numbered transfers.
    pub async fn append_numbered(&self, n: u64) -> Result<()> {
        for i in 0..n {
            self.ledger.append(numbered_transfer(i)).await?;
        }
        Ok(())
    }
}

async fn open(
    store: &Arc<MemoryStore>,
    clock: &Arc<ManualClock>,
    config: &LedgerConfig,
) -> Result<Ledger<MemoryStore, MemoryStore>> {
    Ledger::initialize_with_clock(store.clone(), store.clone(), config.clone(), clock.clone())
        .await
}

/// `report.pdf`, 2048 bytes, alice to bob.
pub fn report_pdf() -> TransferRecord {
    TransferRecord::new("report.pdf", "alice", "bob", FileSize::new(2048))
}

/// A distinct transfer per `i`.
pub fn numbered_transfer(i: u64) -> TransferRecord {
    TransferRecord::new(
        format!("file-{i}.bin"),
        format!("sender-{}", i % 3),
        format!("receiver-{}", i % 5),
        FileSize::new(i * 512),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_starts_with_genesis() {
        let fixture = TestLedger::new().await.unwrap();
        assert_eq!(fixture.ledger.len().await, 1);
        assert_eq!(fixture.ledger.genesis().await.timestamp(), FIXTURE_START);
    }

    #[tokio::test]
    async fn test_restart_keeps_chain() {
        let mut fixture = TestLedger::new().await.unwrap();
        fixture.append_numbered(3).await.unwrap();
        let before = fixture.ledger.hash_sequence().await;

        fixture.restart().await.unwrap();
        assert_eq!(fixture.ledger.hash_sequence().await, before);
    }
}
