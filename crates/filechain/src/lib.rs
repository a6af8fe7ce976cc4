//! # Filechain
//!
//! An append-only, hash-linked ledger of file transfers.
//!
//! ## Overview
//!
//! Every transfer (file name, sender, receiver, size) becomes a block whose
//! SHA-512 hash covers its contents and the hash of the block before it.
//! Blocks are persisted twice:
//!
//! - **Rows**: one row per block in an append-only table
//! - **Snapshot**: the whole chain, so a restart resumes the exact tip
//!
//! ## Key Concepts
//!
//! - **Genesis**: The first block. Created once, on the first run.
//! - **Append**: The only mutation. Row first, then snapshot, then tip.
//! - **Recovery**: A restart loads the snapshot; rows without a snapshot
//!   are an error, never a second genesis.
//! - **Audit**: Recompute every stored hash from the rows alone.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use filechain::{open_sqlite, LedgerConfig};
//!
//! async fn example() {
//!     let ledger = open_sqlite(LedgerConfig::in_dir("/var/lib/filechain"))
//!         .await
//!         .unwrap();
//!
//!     let hash = ledger
//!         .append_block("report.pdf", "alice", "bob", "2048")
//!         .await
//!         .unwrap();
//!     println!("appended {hash}");
//!
//!     assert!(ledger.audit().await.unwrap().is_clean());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `filechain::core` - Blocks, hashing and the chain arena
//! - `filechain::store` - Record and snapshot storage

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod open;
pub mod service;

// Re-export component crates
pub use filechain_core as core;
pub use filechain_store as store;

// Re-export main types for convenience
pub use audit::{AuditIssue, AuditReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{default_genesis, AppendPolicy, ExistingStorage, LedgerConfig};
pub use error::{ErrorKind, LedgerError, Result};
pub use ledger::Ledger;
pub use open::{open_sqlite, open_sqlite_with_clock, SqliteLedger};
pub use service::{AppendRequest, AppendResponse, AppendService, FileSizeInput};

// Re-export commonly used core types
pub use filechain_core::{Block, BlockHash, BlockIndex, FileSize, Timestamp, TransferRecord};
