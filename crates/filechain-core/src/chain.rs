//! Chain: the in-memory arena of blocks from genesis to tip.
//!
//! Blocks live in a `Vec` indexed by position. Forward and backward links
//! are indices into that arena, so there is exactly one owner (the chain)
//! and the tip is simply the last element.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::block::{Block, TransferRecord};
use crate::crypto::BlockHash;
use crate::error::ChainError;
use crate::types::{BlockIndex, Timestamp};
use crate::validation::{verify_blocks, verify_link};

/// Current snapshot encoding version.
pub const SNAPSHOT_FORMAT_VERSION: u8 = 1;

/// Durable form of a chain: the genesis block and every block after it.
///
/// `blocks[0]` is the genesis block and the last element is the current
/// block. Decoding a snapshot yields this owned form; encoding borrows the
/// live chain through [`SnapshotRef`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainSnapshot {
    pub format: u8,
    pub blocks: Vec<Block>,
}

impl ChainSnapshot {
    pub fn genesis_block(&self) -> Option<&Block> {
        self.blocks.first()
    }

    pub fn current_block(&self) -> Option<&Block> {
        self.blocks.last()
    }
}

/// Borrowed view of a chain for serialization.
///
/// Serializes to the same shape [`ChainSnapshot`] deserializes from. The
/// blocks are `settled` followed by `tail`, which lets a staged extension
/// be encoded without copying the settled blocks.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRef<'a> {
    pub format: u8,
    settled: &'a [Block],
    tail: &'a [Block],
}

impl<'a> SnapshotRef<'a> {
    /// Number of blocks the snapshot will hold.
    pub fn len(&self) -> usize {
        self.settled.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn blocks(&self) -> impl Iterator<Item = &'a Block> {
        self.settled.iter().chain(self.tail)
    }
}

impl Serialize for SnapshotRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Blocks<'b>(SnapshotRef<'b>);

        impl Serialize for Blocks<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_seq(self.0.blocks())
            }
        }

        let mut state = serializer.serialize_struct("ChainSnapshot", 2)?;
        state.serialize_field("format", &self.format)?;
        state.serialize_field("blocks", &Blocks(*self))?;
        state.end()
    }
}

/// A verified successor of a chain's tip, not yet attached.
///
/// Holds the block and a copy of the old tip with its `next_block` set, so
/// the extended chain can be snapshotted while the chain itself stays
/// untouched. Attach it with [`Chain::push`] once it is durable.
#[derive(Debug, Clone)]
pub struct StagedBlock<'a> {
    settled: &'a [Block],
    /// `[linked old tip, new block]`
    tail: [Block; 2],
}

impl StagedBlock<'_> {
    pub fn block(&self) -> &Block {
        &self.tail[1]
    }

    /// Snapshot of the chain as it will be once the block is attached.
    pub fn as_snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            format: SNAPSHOT_FORMAT_VERSION,
            settled: self.settled,
            tail: &self.tail,
        }
    }

    pub fn into_block(self) -> Block {
        let [_, block] = self.tail;
        block
    }
}

/// An initialized chain. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Start a chain with a freshly created genesis block.
    pub fn new(genesis_data: TransferRecord, timestamp: Timestamp) -> Self {
        Self {
            blocks: vec![Block::genesis(genesis_data, timestamp)],
        }
    }

    /// Rebuild a chain from a decoded snapshot, verifying every block.
    pub fn from_snapshot(snapshot: ChainSnapshot) -> Result<Self, ChainError> {
        if snapshot.format != SNAPSHOT_FORMAT_VERSION {
            return Err(ChainError::UnsupportedFormat(snapshot.format));
        }
        verify_blocks(&snapshot.blocks)?;
        Ok(Self {
            blocks: snapshot.blocks,
        })
    }

    pub fn as_snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            format: SNAPSHOT_FORMAT_VERSION,
            settled: &self.blocks,
            tail: &[],
        }
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; a chain holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn genesis_block(&self) -> &Block {
        &self.blocks[0]
    }

    /// The chain tip, the only block that may be extended.
    pub fn current_block(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn get(&self, index: BlockIndex) -> Option<&Block> {
        self.blocks.get(index.as_usize())
    }

    pub fn next_of(&self, block: &Block) -> Option<&Block> {
        block.next_block().and_then(|i| self.get(i))
    }

    pub fn prev_of(&self, block: &Block) -> Option<&Block> {
        block.prev_block().and_then(|i| self.get(i))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Block hashes from genesis to tip.
    pub fn hashes(&self) -> Vec<BlockHash> {
        self.blocks.iter().map(|b| *b.hash()).collect()
    }

    /// Build (but do not attach) the block that would extend the tip.
    pub fn candidate(&self, data: TransferRecord, timestamp: Timestamp) -> Block {
        Block::successor(self.current_block(), data, timestamp)
    }

    /// Attach a block built on the current tip.
    pub fn push(&mut self, block: Block) -> Result<BlockIndex, ChainError> {
        self.check_successor(&block)?;

        let index = block.index();
        let tip_position = self.blocks.len() - 1;
        self.blocks[tip_position].link_next(index)?;
        self.blocks.push(block);
        Ok(index)
    }

    /// Verify `block` against the tip and stage it without attaching it.
    ///
    /// Only the tip is copied; the rest of the chain is borrowed.
    pub fn stage(&self, block: Block) -> Result<StagedBlock<'_>, ChainError> {
        self.check_successor(&block)?;

        let (tip, settled) = self.blocks.split_last().ok_or(ChainError::Empty)?;
        let mut linked_tip = tip.clone();
        linked_tip.link_next(block.index())?;

        Ok(StagedBlock {
            settled,
            tail: [linked_tip, block],
        })
    }

    fn check_successor(&self, block: &Block) -> Result<(), ChainError> {
        let tip = self.current_block();
        verify_link(tip, block).map_err(|_| ChainError::NotTipSuccessor(block.index()))?;
        if block.next_block().is_some() {
            return Err(ChainError::NextPointer {
                index: block.index(),
                expected: None,
                found: block.next_block(),
            });
        }
        if !block.verify_hash() {
            return Err(ChainError::HashMismatch(block.index()));
        }
        Ok(())
    }
}
