//! Database module - provides the SQLite-backed connection

use log::{debug, trace};
use rusqlite::Connection as RawConnection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::config::SqliteConfig;
use super::cursor::SqliteCursor;
use super::driver::Connection;
use crate::error::{Error, Result};

/// Handle shared between a connection and the cursors it creates.
/// `None` once the connection has been closed.
pub(crate) type SharedConn = Arc<Mutex<Option<RawConnection>>>;

/// Run `f` against the open handle.
pub(crate) fn with_conn<T>(
    conn: &SharedConn,
    f: impl FnOnce(&RawConnection) -> Result<T>,
) -> Result<T> {
    let guard = conn.lock().map_err(|_| Error::Lock)?;
    let conn = guard.as_ref().ok_or(Error::Closed)?;
    f(conn)
}

/// Column description from `pragma_table_info`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: i64,
}

/// SQLite database connection
pub struct SqliteConnection {
    conn: SharedConn,
    config: SqliteConfig,
}

impl SqliteConnection {
    /// Open a database file with the default config
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &SqliteConfig::default())
    }

    /// Open a private in-memory database with the default config
    pub fn open_in_memory() -> Result<Self> {
        Self::open_with(":memory:", &SqliteConfig::default())
    }

    /// Open a database, applying the PRAGMAs from `config`.
    ///
    /// The path `":memory:"` opens an in-memory database.
    pub fn open_with(path: impl AsRef<Path>, config: &SqliteConfig) -> Result<Self> {
        let path = path.as_ref();
        let conn = if path == Path::new(":memory:") {
            RawConnection::open_in_memory()?
        } else {
            RawConnection::open(path)?
        };

        // Enable extended result codes for better error handling
        conn.execute_batch("PRAGMA extended_result_codes = ON")?;
        conn.execute_batch(&config.pragma_script())?;
        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }
        debug!("opened sqlite database at {}", path.display());

        Ok(SqliteConnection {
            conn: Arc::new(Mutex::new(Some(conn))),
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Whether a transaction is currently open
    pub fn in_transaction(&self) -> Result<bool> {
        with_conn(&self.conn, |conn| Ok(!conn.is_autocommit()))
    }

    /// Run a script of one or more statements without parameters
    pub fn exec(&self, sql: &str) -> Result<()> {
        with_conn(&self.conn, |conn| Ok(conn.execute_batch(sql)?))
    }

    /// Get list of all user tables in the database
    pub fn tables(&self) -> Result<Vec<String>> {
        with_conn(&self.conn, |conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let tables = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(tables)
        })
    }

    /// Check if a table exists
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        with_conn(&self.conn, |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table_name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Get column information for a table
    pub fn columns(&self, table_name: &str) -> Result<Vec<ColumnInfo>> {
        with_conn(&self.conn, |conn| {
            let mut stmt = conn.prepare(
                "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?)",
            )?;
            let columns = stmt
                .query_map([table_name], |row| {
                    Ok(ColumnInfo {
                        cid: row.get(0)?,
                        name: row.get(1)?,
                        decl_type: row.get(2)?,
                        not_null: row.get::<_, i64>(3)? == 1,
                        default_value: row.get(4)?,
                        primary_key: row.get(5)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(columns)
        })
    }

    /// Export the entire schema as SQL statements
    pub fn export_schema(&self) -> Result<String> {
        with_conn(&self.conn, |conn| {
            let mut stmt = conn.prepare(
                "SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY CASE WHEN type = 'table' THEN 1 WHEN type = 'index' THEN 2 ELSE 3 END, name",
            )?;
            let statements = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(statements.join(";\n"))
        })
    }
}

impl Connection for SqliteConnection {
    type Cursor = SqliteCursor;

    fn cursor(&mut self) -> Result<SqliteCursor> {
        with_conn(&self.conn, |_| Ok(()))?;
        let implicit_begin = self
            .config
            .implicit_transactions
            .then_some(self.config.transaction_mode);
        Ok(SqliteCursor::new(self.conn.clone(), implicit_begin))
    }

    fn commit(&mut self) -> Result<()> {
        with_conn(&self.conn, |conn| {
            if !conn.is_autocommit() {
                trace!("COMMIT");
                conn.execute_batch("COMMIT")?;
            }
            Ok(())
        })
    }

    fn supports_sync(&self) -> bool {
        true
    }

    /// Checkpoint the write-ahead log into the main database file
    fn sync(&mut self) -> Result<()> {
        with_conn(&self.conn, |conn| {
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
            Ok(())
        })
    }

    fn supports_close(&self) -> bool {
        true
    }

    /// Close the handle; closing twice is a no-op
    fn close(&mut self) -> Result<()> {
        let mut guard = self.conn.lock().map_err(|_| Error::Lock)?;
        if let Some(conn) = guard.take() {
            if let Err((conn, e)) = conn.close() {
                *guard = Some(conn);
                return Err(e.into());
            }
            debug!("closed sqlite database");
        }
        Ok(())
    }
}
