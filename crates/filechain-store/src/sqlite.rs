//! SQLite implementation of the RecordStore trait.
//!
//! This is the primary storage backend for filechain. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{params, params_from_iter, Connection, ErrorCode};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::row::{ColumnValue, LedgerRow, RowId, TableSchema, LEDGER_SCHEMA};
use crate::traits::RecordStore;

/// SQLite-based record store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file if it doesn't exist. The ledger table itself is
    /// created by [`RecordStore::ensure_table`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(StoreError::poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(StoreError::task_failed)?
    }
}

impl ToSql for ColumnValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            ColumnValue::Text(s) => s.to_sql(),
            ColumnValue::Integer(i) => i.to_sql(),
        }
    }
}

/// Constraint violations are integrity errors; everything else stays a
/// database error.
fn map_insert_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Integrity(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        _ => StoreError::Database(err),
    }
}

type RawRow = (i64, String, String, String, String, i64, String);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn ensure_table(&self, schema: &TableSchema) -> Result<()> {
        let schema = *schema;
        self.blocking(move |conn| migration::migrate(conn, &schema))
            .await?;
        tracing::debug!(table = schema.name, "ledger table ready");
        Ok(())
    }

    async fn insert_row(&self, row: &LedgerRow) -> Result<RowId> {
        let values = row.column_values()?;

        self.blocking(move |conn| {
            let mut stmt = conn.prepare_cached(&LEDGER_SCHEMA.insert_sql())?;
            stmt.execute(params_from_iter(values.iter().map(|(_, v)| v)))
                .map_err(map_insert_error)?;
            Ok(RowId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn scan_page(
        &self,
        after: Option<RowId>,
        limit: usize,
    ) -> Result<Vec<(RowId, LedgerRow)>> {
        let after = after.map_or(0, |id| id.0);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let raw: Vec<RawRow> = self
            .blocking(move |conn| {
                let mut stmt = conn.prepare_cached(&LEDGER_SCHEMA.select_sql())?;
                let rows = stmt
                    .query_map(params![after, limit], read_raw)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        raw.into_iter()
            .map(|(id, file_name, sender, receiver, ts, size, hash)| {
                LedgerRow::from_columns(file_name, sender, receiver, &ts, size, &hash)
                    .map(|row| (RowId(id), row))
            })
            .collect()
    }

    async fn row_count(&self) -> Result<u64> {
        let count: i64 = self
            .blocking(|conn| {
                let sql = format!("SELECT COUNT(*) FROM {}", LEDGER_SCHEMA.name);
                Ok(conn.query_row(&sql, [], |row| row.get(0))?)
            })
            .await?;

        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative row count {count}")))
    }
}
