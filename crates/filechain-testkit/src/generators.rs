//! Proptest generators for property-based testing.

use proptest::prelude::*;

use filechain_core::{FileSize, Timestamp, TransferRecord};

/// Generate a name: ASCII or arbitrary Unicode, possibly empty.
pub fn name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9_.-]{0,31}".prop_map(String::from),
        any::<String>(),
    ]
}

/// Generate a file size that fits the ledger table's INTEGER column.
pub fn file_size() -> impl Strategy<Value = u64> {
    0u64..=i64::MAX as u64
}

/// Generate a file size as callers send it in text form.
pub fn file_size_text() -> impl Strategy<Value = String> {
    file_size().prop_map(|n| n.to_string())
}

/// Generate a timestamp between 1970 and roughly 2100.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    (0u64..=4_102_444_800_000_000u64).prop_map(Timestamp::from_micros)
}

/// Generate a TransferRecord.
pub fn transfer_record() -> impl Strategy<Value = TransferRecord> {
    any::<TransferParams>().prop_map(|p| record_from_params(&p))
}

/// Generate up to `max` transfer records.
pub fn transfers(max: usize) -> impl Strategy<Value = Vec<TransferRecord>> {
    prop::collection::vec(transfer_record(), 0..=max)
}

/// Parameters for generating a transfer.
#[derive(Debug, Clone)]
pub struct TransferParams {
    pub file_name: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub file_size: u64,
}

impl Arbitrary for TransferParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (name(), name(), name(), file_size())
            .prop_map(|(file_name, sender_name, receiver_name, file_size)| TransferParams {
                file_name,
                sender_name,
                receiver_name,
                file_size,
            })
            .boxed()
    }
}

/// Build a transfer record from parameters.
pub fn record_from_params(params: &TransferParams) -> TransferRecord {
    TransferRecord::new(
        params.file_name.clone(),
        params.sender_name.clone(),
        params.receiver_name.clone(),
        FileSize::new(params.file_size),
    )
}
