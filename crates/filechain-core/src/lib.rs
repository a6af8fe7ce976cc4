//! # Filechain Core
//!
//! Pure primitives for filechain: transfer records, blocks, canonical
//! hashing, and the in-memory chain arena.
//!
//! This crate contains no I/O, no storage, no async. It is pure computation
//! over the hash-linked data structure.
//!
//! ## Key Types
//!
//! - [`Block`] - One ledger entry plus its linkage and integrity hash
//! - [`BlockHash`] - 512-bit SHA-512 digest identifying a block
//! - [`TransferRecord`] - The file-transfer payload carried by a block
//! - [`Chain`] - Arena of blocks from genesis to tip
//! - [`ChainSnapshot`] - Serializable form of a chain for crash recovery
//!
//! ## Hashing
//!
//! Block hashes are computed over a length-prefixed canonical encoding of
//! `(timestamp, data, prev_hash)`. See the [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod chain;
pub mod crypto;
pub mod error;
pub mod types;
pub mod validation;

pub use block::{Block, TransferRecord};
pub use canonical::{block_hash, canonical_message, BLOCK_HASH_DOMAIN};
pub use chain::{Chain, ChainSnapshot, SnapshotRef, StagedBlock, SNAPSHOT_FORMAT_VERSION};
pub use crypto::{BlockHash, HASH_LEN};
pub use error::{ChainError, ValidationError};
pub use types::{BlockIndex, FileSize, Timestamp};
pub use validation::{verify_blocks, verify_link};
