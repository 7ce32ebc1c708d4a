//! SQLite destination writer.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

use crate::core::identifier::quote_sqlite;
use crate::core::schema::TableSchema;
use crate::core::traits::TargetWriter;
use crate::core::value::{Batch, SqlValue, DATETIME_TEXT_FORMAT};
use crate::error::Result;

/// Writes converted tables into a SQLite database.
pub struct SqliteWriter {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteWriter {
    /// Open the destination database file.
    ///
    /// With `overwrite`, an existing file at `path` is deleted first so the run
    /// starts from an empty database.
    pub fn create(path: impl AsRef<Path>, overwrite: bool) -> Result<Self> {
        let path = path.as_ref();
        if overwrite && path.exists() {
            info!("Removing existing destination database {}", path.display());
            fs::remove_file(path)?;
        }

        let conn = Connection::open(path)?;
        debug!("Opened SQLite database {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Database file, or `None` for an in-memory database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Underlying connection, for inspecting the written data.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Render `CREATE TABLE` for a mapped table.
pub(crate) fn create_table_sql(table: &TableSchema) -> Result<String> {
    let columns = table
        .columns
        .iter()
        .map(|c| {
            let null = if c.is_nullable { "" } else { " NOT NULL" };
            Ok(format!("{} {}{}", quote_sqlite(&c.name)?, c.target_type, null))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_sqlite(&table.name)?,
        columns.join(", ")
    ))
}

fn insert_sql(table: &str, cols: &[String]) -> Result<String> {
    let col_list = cols
        .iter()
        .map(|c| quote_sqlite(c))
        .collect::<Result<Vec<_>>>()?
        .join(", ");
    let placeholders = (1..=cols.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_sqlite(table)?,
        col_list,
        placeholders
    ))
}

impl TargetWriter for SqliteWriter {
    fn create_table(&mut self, table: &TableSchema) -> Result<()> {
        let ddl = create_table_sql(table)?;
        debug!("DDL: {}", ddl);
        self.conn.execute_batch(&ddl)?;
        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn write_batch(&mut self, table: &str, cols: &[String], batch: Batch) -> Result<u64> {
        if batch.is_empty() {
            return Ok(0);
        }

        let sql = insert_sql(table, cols)?;
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for row in &batch.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        Ok(batch.len() as u64)
    }

    fn row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_sqlite(table)?);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::I64(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::F64(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::DateTime(dt) => {
                ToSqlOutput::Owned(Value::Text(dt.format(DATETIME_TEXT_FORMAT).to_string()))
            }
        })
    }
}
