//! The persisted ledger row and its table schema.
//!
//! Column layout is stable across implementations:
//! `file_name, sender_name, receiver_name, timestamp, file_size, hash`.
//! Inserts always name their columns, so values can never drift into the
//! wrong column.

use filechain_core::{Block, BlockHash, FileSize, Timestamp, TransferRecord};

use crate::error::{Result, StoreError};

/// Storage-assigned position of a row. Increases with insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub i64);

/// A declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
}

/// A declared table shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TableSchema {
    /// `CREATE TABLE IF NOT EXISTS` statement for this shape.
    pub fn create_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {} NOT NULL", c.name, c.sql_type))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            cols.join(", ")
        )
    }

    /// Named-column insert with positional placeholders in column order.
    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            names.join(", "),
            placeholders.join(", ")
        )
    }

    pub fn select_sql(&self) -> String {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        format!(
            "SELECT rowid, {} FROM {} WHERE rowid > ?1 ORDER BY rowid LIMIT ?2",
            names.join(", "),
            self.name
        )
    }

    /// Human-readable `name TYPE, ...` listing used in schema errors.
    pub fn describe(&self) -> String {
        describe_columns(self.columns.iter().map(|c| (c.name, c.sql_type)))
    }
}

pub(crate) fn describe_columns<'a>(cols: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    cols.map(|(n, t)| format!("{n} {t}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The ledger table.
pub const LEDGER_SCHEMA: TableSchema = TableSchema {
    name: "blockchain",
    columns: &[
        Column { name: "file_name", sql_type: "VARCHAR(256)" },
        Column { name: "sender_name", sql_type: "VARCHAR(50)" },
        Column { name: "receiver_name", sql_type: "VARCHAR(50)" },
        Column { name: "timestamp", sql_type: "VARCHAR(100)" },
        Column { name: "file_size", sql_type: "INTEGER" },
        Column { name: "hash", sql_type: "VARCHAR" },
    ],
};

/// A typed value bound to one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(String),
    Integer(i64),
}

/// One persisted block.
///
/// `prev_hash` is not stored; it is the `hash` of the preceding row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub file_name: String,
    pub sender_name: String,
    pub receiver_name: String,
    pub timestamp: Timestamp,
    pub file_size: FileSize,
    pub hash: BlockHash,
}

impl LedgerRow {
    pub fn from_block(block: &Block) -> Self {
        let data = block.data();
        Self {
            file_name: data.file_name.clone(),
            sender_name: data.sender_name.clone(),
            receiver_name: data.receiver_name.clone(),
            timestamp: block.timestamp(),
            file_size: data.file_size,
            hash: *block.hash(),
        }
    }

    /// The transfer payload carried by this row.
    pub fn transfer(&self) -> TransferRecord {
        TransferRecord::new(
            self.file_name.clone(),
            self.sender_name.clone(),
            self.receiver_name.clone(),
            self.file_size,
        )
    }

    /// Values in [`LEDGER_SCHEMA`] column order.
    ///
    /// Fails with [`StoreError::Integrity`] when a value cannot be coerced to
    /// its column type.
    pub fn column_values(&self) -> Result<[(&'static str, ColumnValue); 6]> {
        let file_size = i64::try_from(self.file_size.bytes()).map_err(|_| {
            StoreError::Integrity(format!(
                "file_size {} exceeds INTEGER range",
                self.file_size
            ))
        })?;

        Ok([
            ("file_name", ColumnValue::Text(self.file_name.clone())),
            ("sender_name", ColumnValue::Text(self.sender_name.clone())),
            ("receiver_name", ColumnValue::Text(self.receiver_name.clone())),
            ("timestamp", ColumnValue::Text(self.timestamp.canonical())),
            ("file_size", ColumnValue::Integer(file_size)),
            ("hash", ColumnValue::Text(self.hash.to_hex())),
        ])
    }

    /// Rebuild a row from raw column values read back from storage.
    pub fn from_columns(
        file_name: String,
        sender_name: String,
        receiver_name: String,
        timestamp: &str,
        file_size: i64,
        hash: &str,
    ) -> Result<Self> {
        let timestamp = Timestamp::parse_canonical(timestamp)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        let file_size = u64::try_from(file_size)
            .map(FileSize::new)
            .map_err(|_| StoreError::InvalidData(format!("negative file_size {file_size}")))?;
        let hash = BlockHash::from_hex(hash).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        Ok(Self {
            file_name,
            sender_name,
            receiver_name,
            timestamp,
            file_size,
            hash,
        })
    }
}

impl From<&Block> for LedgerRow {
    fn from(block: &Block) -> Self {
        Self::from_block(block)
    }
}
