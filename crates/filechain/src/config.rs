//! Ledger configuration.

use std::path::PathBuf;

use filechain_core::{FileSize, TransferRecord};
use filechain_store::DEFAULT_SCAN_PAGE_SIZE;
use serde::Deserialize;

use crate::error::{LedgerError, Result};

/// What an append does when another append already holds the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendPolicy {
    /// Wait for the in-flight append to finish.
    #[default]
    Queue,
    /// Fail immediately with [`LedgerError::Concurrency`].
    FailFast,
}

/// What opening storage does when a database or snapshot already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingStorage {
    /// Resume the existing chain.
    #[default]
    Reuse,
    /// Delete the existing database and snapshot, then start a new chain.
    Overwrite,
    /// Refuse to open.
    Fail,
}

/// Configuration for the Ledger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// SQLite database holding the ledger table.
    pub db_path: PathBuf,
    /// File holding the chain snapshot.
    pub snapshot_path: PathBuf,
    /// Payload of the genesis block, used only when a new chain is created.
    pub genesis: TransferRecord,
    pub append_policy: AppendPolicy,
    pub on_existing: ExistingStorage,
    /// Rows fetched per page when scanning the table.
    pub scan_page_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("filechain.db"),
            snapshot_path: PathBuf::from("filechain.snapshot"),
            genesis: default_genesis(),
            append_policy: AppendPolicy::Queue,
            on_existing: ExistingStorage::Reuse,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

/// The genesis payload every new chain starts from unless configured.
pub fn default_genesis() -> TransferRecord {
    TransferRecord::new("rishabh_bhatnagar", "rishabh", "bhatnagar", FileSize::ZERO)
}

impl LedgerConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Keep both storage files under `dir`, with default file names.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            db_path: dir.join("filechain.db"),
            snapshot_path: dir.join("filechain.snapshot"),
            ..Self::default()
        }
    }

    pub fn with_append_policy(mut self, policy: AppendPolicy) -> Self {
        self.append_policy = policy;
        self
    }

    pub fn with_genesis(mut self, genesis: TransferRecord) -> Self {
        self.genesis = genesis;
        self
    }

    pub fn with_on_existing(mut self, on_existing: ExistingStorage) -> Self {
        self.on_existing = on_existing;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_page_size == 0 {
            return Err(LedgerError::Config("scan_page_size must be positive".into()));
        }
        if self.db_path == self.snapshot_path {
            return Err(LedgerError::Config(
                "db_path and snapshot_path must differ".into(),
            ));
        }
        Ok(())
    }
}
