//! Canonical encoding for block hashing.
//!
//! The hash input is a domain tag followed by six length-prefixed UTF-8
//! fields in a fixed order:
//!
//! ```text
//! "filechain/block/v1"
//!   || field(timestamp)      "<secs>.<micros>" with six fractional digits
//!   || field(file_name)
//!   || field(sender_name)
//!   || field(receiver_name)
//!   || field(file_size)      decimal
//!   || field(prev_hash)      lowercase hex, "" for genesis
//!
//! field(s) = u64_be(len(s)) || s
//! ```
//!
//! The order is declared here, never derived from map iteration, so the same
//! `(timestamp, data, prev_hash)` always produces the same bytes. Everything
//! that enters the message is also stored in the ledger row (with `prev_hash`
//! taken from the preceding row), so any chain can be re-verified from
//! storage alone.

use crate::block::TransferRecord;
use crate::crypto::BlockHash;
use crate::types::Timestamp;

/// Domain separation tag prefixed to every block hash input.
pub const BLOCK_HASH_DOMAIN: &[u8] = b"filechain/block/v1";

/// Build the canonical hash input for a block.
pub fn canonical_message(
    timestamp: Timestamp,
    data: &TransferRecord,
    prev_hash: Option<&BlockHash>,
) -> Vec<u8> {
    let timestamp = timestamp.canonical();
    let prev = prev_hash.map(BlockHash::to_hex).unwrap_or_default();
    let file_size = data.file_size.to_string();

    let fields: [&str; 6] = [
        &timestamp,
        &data.file_name,
        &data.sender_name,
        &data.receiver_name,
        &file_size,
        &prev,
    ];

    let mut buf = Vec::with_capacity(
        BLOCK_HASH_DOMAIN.len() + fields.iter().map(|f| 8 + f.len()).sum::<usize>(),
    );
    buf.extend_from_slice(BLOCK_HASH_DOMAIN);
    for field in fields {
        encode_field(&mut buf, field);
    }
    buf
}

/// Compute the hash of a block from its parts.
pub fn block_hash(
    timestamp: Timestamp,
    data: &TransferRecord,
    prev_hash: Option<&BlockHash>,
) -> BlockHash {
    BlockHash::digest(&canonical_message(timestamp, data, prev_hash))
}

fn encode_field(buf: &mut Vec<u8>, field: &str) {
    buf.extend_from_slice(&(field.len() as u64).to_be_bytes());
    buf.extend_from_slice(field.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileSize;

    fn genesis_record() -> TransferRecord {
        TransferRecord::new("rishabh_bhatnagar", "rishabh", "bhatnagar", FileSize::ZERO)
    }

    #[test]
    fn test_genesis_message_layout() {
        let msg = canonical_message(
            Timestamp::from_micros(1_736_870_400_000_000),
            &genesis_record(),
            None,
        );
        assert_eq!(
            hex::encode(&msg),
            "66696c65636861696e2f626c6f636b2f7631\
             0000000000000011313733363837303430302e303030303030\
             0000000000000011726973686162685f626861746e61676172\
             000000000000000772697368616268\
             0000000000000009626861746e61676172\
             000000000000000130\
             0000000000000000"
        );
    }

    #[test]
    fn test_genesis_hash_golden() {
        let h = block_hash(
            Timestamp::from_micros(1_736_870_400_000_000),
            &genesis_record(),
            None,
        );
        assert_eq!(
            h.to_hex(),
            "f43f24a388e2edf28c5fde7f67c757f45720e47355408058fa77db7ec16bee98\
             14fd8bd0e57e215d8b30fc98614229a336cb8a430bce5b22838ed0c61b5c9206"
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        let record = TransferRecord::new("report.pdf", "alice", "bob", FileSize::new(2048));
        let ts = Timestamp::from_micros(42);
        let prev = BlockHash::digest(b"prev");
        assert_eq!(
            block_hash(ts, &record, Some(&prev)),
            block_hash(ts, &record, Some(&prev))
        );
    }

    #[test]
    fn test_every_input_affects_hash() {
        let record = TransferRecord::new("report.pdf", "alice", "bob", FileSize::new(2048));
        let ts = Timestamp::from_micros(42);
        let prev = BlockHash::digest(b"prev");
        let base = block_hash(ts, &record, Some(&prev));

        assert_ne!(base, block_hash(Timestamp::from_micros(43), &record, Some(&prev)));
        assert_ne!(base, block_hash(ts, &record, None));

        let mut other = record.clone();
        other.file_size = FileSize::new(2049);
        assert_ne!(base, block_hash(ts, &other, Some(&prev)));

        // Swapping sender and receiver must change the hash.
        let swapped = TransferRecord::new("report.pdf", "bob", "alice", FileSize::new(2048));
        assert_ne!(base, block_hash(ts, &swapped, Some(&prev)));
    }

    #[test]
    fn test_length_prefix_prevents_field_shifting() {
        let ts = Timestamp::from_micros(1);
        let a = TransferRecord::new("ab", "c", "d", FileSize::ZERO);
        let b = TransferRecord::new("a", "bc", "d", FileSize::ZERO);
        assert_ne!(block_hash(ts, &a, None), block_hash(ts, &b, None));
    }
}
