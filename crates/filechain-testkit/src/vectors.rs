//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical block encoding: any implementation that
//! hashes the same inputs must produce exactly these SHA-512 digests.

use filechain_core::{block_hash, BlockHash, FileSize, Timestamp, TransferRecord};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct HashVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Block timestamp in microseconds since the epoch.
    pub timestamp_micros: u64,
    pub file_name: &'static str,
    pub sender_name: &'static str,
    pub receiver_name: &'static str,
    pub file_size: u64,
    /// Predecessor hash (hex), `None` for a genesis block.
    pub prev_hash: Option<&'static str>,
    /// Expected block hash (hex).
    pub expected_hash: &'static str,
}

const GENESIS_HASH: &str = "f43f24a388e2edf28c5fde7f67c757f45720e47355408058fa77db7ec16bee98\
                            14fd8bd0e57e215d8b30fc98614229a336cb8a430bce5b22838ed0c61b5c9206";
const REPORT_1_HASH: &str = "00f360d65ce7dcec313b50e19863238fe116fbddc408044e45c2635f89faff36\
                             bcb24c1c3daa0a6e61c6821e64b889aed6e608cde5d2da2d1cc50824e785aefc";
const REPORT_2_HASH: &str = "29cec0c98185dd425e28375a9fc8872220207bb5f3cf1c9666b0853fc8adc1b9\
                             dcc9ef2716fa74b986c5b8fba5da94e439af9294017c365cc1382a31f06e3015";

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<HashVector> {
    vec![
        HashVector {
            name: "default genesis",
            timestamp_micros: 1_736_870_400_000_000,
            file_name: "rishabh_bhatnagar",
            sender_name: "rishabh",
            receiver_name: "bhatnagar",
            file_size: 0,
            prev_hash: None,
            expected_hash: GENESIS_HASH,
        },
        HashVector {
            name: "report.pdf after genesis",
            timestamp_micros: 1_736_870_401_000_000,
            file_name: "report.pdf",
            sender_name: "alice",
            receiver_name: "bob",
            file_size: 2048,
            prev_hash: Some(GENESIS_HASH),
            expected_hash: REPORT_1_HASH,
        },
        HashVector {
            name: "report.pdf again",
            timestamp_micros: 1_736_870_402_000_000,
            file_name: "report.pdf",
            sender_name: "alice",
            receiver_name: "bob",
            file_size: 2048,
            prev_hash: Some(REPORT_1_HASH),
            expected_hash: REPORT_2_HASH,
        },
        HashVector {
            name: "all fields empty",
            timestamp_micros: 0,
            file_name: "",
            sender_name: "",
            receiver_name: "",
            file_size: 0,
            prev_hash: None,
            expected_hash: "8195796969881d6230a0c07155f322c4cb7ccdf42c56fd9b240981f8d3ee4b2d\
                            3f3507f6d18dec720082eb5abe219065966c524324eb9c2ebac8a232a0c09e89",
        },
        HashVector {
            name: "unicode names and maximum size",
            timestamp_micros: 1_500_000_000_123_456,
            file_name: "résumé.txt",
            sender_name: "zoë",
            receiver_name: "李",
            file_size: u64::MAX,
            prev_hash: None,
            expected_hash: "8d5a790206bbfe04f56116c2871b095444c2b5525407238b3958bce6da524050\
                            5b60df7a8a762cfeaf57ab59f61455adb93bc04d02088db769faeb54517d6f3d",
        },
    ]
}

/// The transfer record a vector describes.
pub fn vector_record(vector: &HashVector) -> TransferRecord {
    TransferRecord::new(
        vector.file_name,
        vector.sender_name,
        vector.receiver_name,
        FileSize::new(vector.file_size),
    )
}

/// Hash a vector's inputs.
///
/// # Panics
///
/// Panics if the vector's `prev_hash` is not valid hex.
pub fn compute_vector_hash(vector: &HashVector) -> BlockHash {
    let prev = vector
        .prev_hash
        .map(|h| BlockHash::from_hex(h).expect("golden prev_hash is valid hex"));
    block_hash(
        Timestamp::from_micros(vector.timestamp_micros),
        &vector_record(vector),
        prev.as_ref(),
    )
}

/// Check every vector, returning `(name, passed, computed_hex)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let computed = hex::encode(compute_vector_hash(v).as_bytes());
            (v.name.to_string(), computed == v.expected_hash, computed)
        })
        .collect()
}
