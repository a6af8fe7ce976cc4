//! Block: one entry of the file-transfer ledger.
//!
//! A block is immutable once created. The single exception is `next_block`,
//! which is filled in exactly once when a successor is appended.

use serde::{Deserialize, Serialize};

use crate::canonical::block_hash;
use crate::crypto::BlockHash;
use crate::error::{ChainError, ValidationError};
use crate::types::{BlockIndex, FileSize, Timestamp};

/// The payload of a block: who sent which file to whom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferRecord {
    pub file_name: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub file_size: FileSize,
}

impl TransferRecord {
    pub fn new(
        file_name: impl Into<String>,
        sender_name: impl Into<String>,
        receiver_name: impl Into<String>,
        file_size: FileSize,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            sender_name: sender_name.into(),
            receiver_name: receiver_name.into(),
            file_size,
        }
    }

    /// Build a record from a file size given as an integer or numeric string.
    pub fn try_new<F>(
        file_name: impl Into<String>,
        sender_name: impl Into<String>,
        receiver_name: impl Into<String>,
        file_size: F,
    ) -> Result<Self, ValidationError>
    where
        F: TryInto<FileSize, Error = ValidationError>,
    {
        Ok(Self::new(
            file_name,
            sender_name,
            receiver_name,
            file_size.try_into()?,
        ))
    }
}

/// A ledger entry plus its chain linkage and integrity hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: BlockIndex,
    data: TransferRecord,
    /// Hash of the predecessor; `None` only for genesis.
    prev_hash: Option<BlockHash>,
    timestamp: Timestamp,
    hash: BlockHash,
    /// Back reference for traversal; the arena owns the blocks.
    prev_block: Option<BlockIndex>,
    next_block: Option<BlockIndex>,
}

impl Block {
    /// Create the first block of a chain.
    pub fn genesis(data: TransferRecord, timestamp: Timestamp) -> Self {
        let hash = block_hash(timestamp, &data, None);
        Self {
            index: BlockIndex::GENESIS,
            data,
            prev_hash: None,
            timestamp,
            hash,
            prev_block: None,
            next_block: None,
        }
    }

    /// Create a block that extends `prev`.
    ///
    /// `prev` is not modified; linking happens when the chain accepts the
    /// new block.
    pub fn successor(prev: &Block, data: TransferRecord, timestamp: Timestamp) -> Self {
        let hash = block_hash(timestamp, &data, Some(&prev.hash));
        Self {
            index: prev.index.next(),
            data,
            prev_hash: Some(prev.hash),
            timestamp,
            hash,
            prev_block: Some(prev.index),
            next_block: None,
        }
    }

    pub fn index(&self) -> BlockIndex {
        self.index
    }

    pub fn data(&self) -> &TransferRecord {
        &self.data
    }

    pub fn prev_hash(&self) -> Option<&BlockHash> {
        self.prev_hash.as_ref()
    }

    /// The predecessor hash in its stored text form (`""` for genesis).
    pub fn prev_hash_hex(&self) -> String {
        self.prev_hash.map(|h| h.to_hex()).unwrap_or_default()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    pub fn prev_block(&self) -> Option<BlockIndex> {
        self.prev_block
    }

    pub fn next_block(&self) -> Option<BlockIndex> {
        self.next_block
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_none()
    }

    /// Recompute the hash from the block's contents.
    pub fn compute_hash(&self) -> BlockHash {
        block_hash(self.timestamp, &self.data, self.prev_hash.as_ref())
    }

    /// Check that the stored hash matches the contents.
    pub fn verify_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Record the successor. Allowed once.
    pub(crate) fn link_next(&mut self, next: BlockIndex) -> Result<(), ChainError> {
        if self.next_block.is_some() {
            return Err(ChainError::NextPointer {
                index: self.index,
                expected: None,
                found: self.next_block,
            });
        }
        self.next_block = Some(next);
        Ok(())
    }
}
