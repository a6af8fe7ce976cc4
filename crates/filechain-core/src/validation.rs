//! Chain verification: hash recomputation and linkage checks.

use crate::block::Block;
use crate::error::ChainError;
use crate::types::BlockIndex;

/// Check that `next` was created as the successor of `prev`.
pub fn verify_link(prev: &Block, next: &Block) -> Result<(), ChainError> {
    let Some(prev_hash) = next.prev_hash() else {
        return Err(ChainError::MissingPrevHash(next.index()));
    };

    if prev_hash != prev.hash()
        || next.prev_block() != Some(prev.index())
        || next.index() != prev.index().next()
    {
        return Err(ChainError::BrokenLink {
            index: next.index(),
            expected_prev: prev.index(),
        });
    }

    Ok(())
}

/// Verify a full sequence of blocks from genesis to tip.
///
/// This performs:
/// - Position check (block `i` carries index `i`)
/// - Genesis rules (no predecessor hash or pointer)
/// - Linkage between consecutive blocks
/// - Hash recomputation for every block
/// - Forward pointers (`next_block` set on every block except the tip)
pub fn verify_blocks(blocks: &[Block]) -> Result<(), ChainError> {
    let Some(genesis) = blocks.first() else {
        return Err(ChainError::Empty);
    };

    if genesis.prev_hash().is_some() || genesis.prev_block().is_some() {
        return Err(ChainError::GenesisHasPredecessor);
    }

    let last = blocks.len() - 1;
    for (position, block) in blocks.iter().enumerate() {
        let expected = BlockIndex(position as u64);
        if block.index() != expected {
            return Err(ChainError::IndexMismatch {
                position: position as u64,
                claimed: block.index(),
            });
        }

        if position > 0 {
            verify_link(&blocks[position - 1], block)?;
        }

        if !block.verify_hash() {
            return Err(ChainError::HashMismatch(block.index()));
        }

        let expected_next = (position < last).then(|| expected.next());
        if block.next_block() != expected_next {
            return Err(ChainError::NextPointer {
                index: block.index(),
                expected: expected_next,
                found: block.next_block(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::TransferRecord;
    use crate::chain::Chain;
    use crate::types::{FileSize, Timestamp};

    fn record(i: u64) -> TransferRecord {
        TransferRecord::new(format!("file-{i}"), "alice", "bob", FileSize::new(i))
    }

    fn chain_of(n: u64) -> Chain {
        let mut chain = Chain::new(record(0), Timestamp::from_micros(1_000));
        for i in 1..=n {
            let b = chain.candidate(record(i), Timestamp::from_micros(1_000 + i));
            chain.push(b).unwrap();
        }
        chain
    }

    #[test]
    fn test_valid_chain_verifies() {
        let chain = chain_of(5);
        verify_blocks(chain.blocks()).unwrap();
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert_eq!(verify_blocks(&[]), Err(ChainError::Empty));
    }

    #[test]
    fn test_missing_block_breaks_chain() {
        let chain = chain_of(3);
        let mut blocks = chain.blocks().to_vec();
        blocks.remove(1);
        assert!(verify_blocks(&blocks).is_err());
    }

    #[test]
    fn test_reordered_blocks_rejected() {
        let chain = chain_of(3);
        let mut blocks = chain.blocks().to_vec();
        blocks.swap(1, 2);
        assert!(matches!(
            verify_blocks(&blocks),
            Err(ChainError::IndexMismatch { position: 1, .. })
        ));
    }

    #[test]
    fn test_unlinked_tip_pointer_rejected() {
        let chain = chain_of(2);
        let blocks = chain.blocks()[..2].to_vec();
        // Block #1 still points at #2, which was cut off.
        assert!(matches!(
            verify_blocks(&blocks),
            Err(ChainError::NextPointer { .. })
        ));
    }

    #[test]
    fn test_foreign_successor_rejected() {
        let a = chain_of(1);
        let b = Chain::new(record(9), Timestamp::from_micros(5));
        let stranger = b.candidate(record(1), Timestamp::from_micros(6));
        assert!(matches!(
            verify_link(a.genesis_block(), &stranger),
            Err(ChainError::BrokenLink { .. })
        ));
    }
}
