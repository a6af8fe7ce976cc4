//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL
//! string that transforms the schema from version N to N+1. After migrating,
//! the ledger table's actual shape is compared against the declared one so
//! that a pre-existing, incompatible table is reported instead of silently
//! written into.
//!
//! Column types are compared by SQLite type affinity, so a table declared
//! with `int` is compatible with one declared `INTEGER`.

use rusqlite::{params, Connection};

use filechain_core::Timestamp;

use crate::error::{Result, StoreError};
use crate::row::{describe_columns, TableSchema};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema, then verify the table shape.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection, schema: &TableSchema) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version, schema)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, Timestamp::now().as_micros() as i64],
            )?;
        }

        tx.commit()?;
    }

    verify_table(conn, schema)
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32, schema: &TableSchema) -> Result<()> {
    match version {
        1 => apply_v1(conn, schema),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: the ledger table.
///
/// `IF NOT EXISTS` lets a table created by an earlier deployment be adopted;
/// its shape is checked afterwards by [`verify_table`].
fn apply_v1(conn: &Connection, schema: &TableSchema) -> Result<()> {
    conn.execute_batch(&schema.create_sql())?;
    Ok(())
}

/// SQLite column type affinity (section 3.1 of the datatype docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

fn affinity(declared: &str) -> Affinity {
    let t = declared.to_ascii_uppercase();
    if t.contains("INT") {
        Affinity::Integer
    } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
        Affinity::Text
    } else if t.is_empty() || t.contains("BLOB") {
        Affinity::Blob
    } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
        Affinity::Real
    } else {
        Affinity::Numeric
    }
}

/// Compare the live table against the declared column names, order and types.
pub fn verify_table(conn: &Connection, schema: &TableSchema) -> Result<()> {
    let mut stmt =
        conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let found: Vec<(String, String)> = stmt
        .query_map(params![schema.name], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let matches = found.len() == schema.columns.len()
        && found
            .iter()
            .zip(schema.columns)
            .all(|((name, ty), col)| name == col.name && affinity(ty) == affinity(col.sql_type));

    if !matches {
        let found = if found.is_empty() {
            "(no table)".to_string()
        } else {
            describe_columns(found.iter().map(|(n, t)| (n.as_str(), t.as_str())))
        };
        return Err(StoreError::Schema {
            table: schema.name.to_string(),
            expected: schema.describe(),
            found,
        });
    }

    Ok(())
}
