//! Error types for filechain core.

use thiserror::Error;

use crate::types::BlockIndex;

/// Validation errors for values that enter a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("file size is empty")]
    EmptyFileSize,

    #[error("file size is not a non-negative integer: {0:?}")]
    InvalidFileSize(String),

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("invalid block hash: {0}")]
    InvalidHash(String),
}

/// Structural or integrity problems in a sequence of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain has no genesis block")]
    Empty,

    #[error("unsupported snapshot format version: {0}")]
    UnsupportedFormat(u8),

    #[error("block at position {position} claims index {claimed}")]
    IndexMismatch { position: u64, claimed: BlockIndex },

    #[error("genesis block must not reference a predecessor")]
    GenesisHasPredecessor,

    #[error("block {0} has no predecessor hash")]
    MissingPrevHash(BlockIndex),

    #[error("block {index} does not link to block {expected_prev}")]
    BrokenLink {
        index: BlockIndex,
        expected_prev: BlockIndex,
    },

    #[error("block {0} stored hash does not match its contents")]
    HashMismatch(BlockIndex),

    #[error("block {index} next pointer is {found:?}, expected {expected:?}")]
    NextPointer {
        index: BlockIndex,
        expected: Option<BlockIndex>,
        found: Option<BlockIndex>,
    },

    #[error("candidate block {0} does not extend the current tip")]
    NotTipSuccessor(BlockIndex),
}
