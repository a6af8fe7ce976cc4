//! # Filechain Store
//!
//! Storage abstraction for filechain. Provides trait-based interfaces for
//! the append-only ledger table and the durable chain-state snapshot, with
//! SQLite, file and in-memory implementations.
//!
//! ## Overview
//!
//! Rows go through the [`RecordStore`] trait and the serialized chain
//! through [`SnapshotStore`], so the ledger is storage-agnostic. The primary
//! implementations are [`SqliteStore`] and [`FileSnapshotStore`], with
//! [`MemoryStore`] (both traits) for testing.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - Async trait for the ledger table
//! - [`SnapshotStore`] - Async trait for the chain snapshot
//! - [`LedgerRow`] - One persisted block
//! - [`RowScan`] - Lazy paged cursor over all rows
//! - [`SqliteStore`] - SQLite-based persistent row storage
//! - [`FileSnapshotStore`] - Atomic file-backed snapshot
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use filechain_store::{
//!     FileSnapshotStore, RecordStore, RecordStoreExt, SqliteStore, LEDGER_SCHEMA,
//! };
//!
//! async fn example() {
//!     let rows = SqliteStore::open("ledger.db").unwrap();
//!     rows.ensure_table(&LEDGER_SCHEMA).await.unwrap();
//!
//!     let snapshots = FileSnapshotStore::new("ledger.snapshot");
//!
//!     let mut scan = rows.scan();
//!     while let Some(row) = scan.next().await.unwrap() {
//!         println!("{} -> {}: {}", row.sender_name, row.receiver_name, row.hash);
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Append-only**: no update or delete statement exists
//! - **Named inserts**: values are bound by column name, in schema order
//! - **Schema checks**: an existing table with another shape is an error
//! - **Atomic snapshots**: write to a temp file, fsync, rename

pub mod error;
pub mod memory;
pub mod migration;
pub mod row;
pub mod snapshot;
pub mod sqlite;
pub mod traits;

pub use error::{Result, SnapshotError, StoreError};
pub use memory::MemoryStore;
pub use row::{Column, ColumnValue, LedgerRow, RowId, TableSchema, LEDGER_SCHEMA};
pub use snapshot::{decode_snapshot, encode_snapshot, FileSnapshotStore};
pub use sqlite::SqliteStore;
pub use traits::{RecordStore, RecordStoreExt, RowScan, SnapshotStore, DEFAULT_SCAN_PAGE_SIZE};
