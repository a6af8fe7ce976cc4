//! # Filechain Testkit
//!
//! Testing utilities for filechain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known block hashes for cross-implementation verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A ledger on in-memory storage with a deterministic clock
//!
//! ## Golden Vectors
//!
//! ```rust
//! use filechain_testkit::vectors::{all_vectors, compute_vector_hash};
//!
//! for vector in all_vectors() {
//!     assert_eq!(compute_vector_hash(&vector).to_hex(), vector.expected_hash);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use filechain_testkit::generators::{record_from_params, TransferParams};
//!
//! proptest! {
//!     #[test]
//!     fn record_round_trips(params: TransferParams) {
//!         let record = record_from_params(&params);
//!         prop_assert_eq!(record.file_size.bytes(), params.file_size);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use filechain_testkit::fixtures::{report_pdf, TestLedger};
//!
//! async fn example() {
//!     let mut fixture = TestLedger::new().await.unwrap();
//!     fixture.ledger.append(report_pdf()).await.unwrap();
//!     fixture.restart().await.unwrap();
//!     assert_eq!(fixture.ledger.len().await, 2);
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{report_pdf, TestLedger};
pub use generators::{record_from_params, TransferParams};
pub use vectors::{all_vectors, compute_vector_hash, verify_all_vectors, HashVector};
