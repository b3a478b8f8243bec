//! Driver seam - the connection and cursor surface the dispatcher runs on

use serde_json::Value;

use super::Row;
use crate::error::{Error, Result};

/// Handle that executes one statement at a time and yields its rows.
///
/// Each `execute` overwrites the metadata and pending rows of the previous one.
pub trait Cursor {
    /// Execute `sql` with positional bind values.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()>;

    /// Affected or returned row count of the last execution, as the driver reports it.
    fn row_count(&self) -> i64;

    /// Identifier of the most recent insert, as the driver reports it.
    fn last_insert_id(&self) -> i64;

    /// Drain all remaining rows of the last execution.
    ///
    /// Returns [`Error::NoResultSet`] when the last statement produced no rows to fetch.
    fn fetch_all(&mut self) -> Result<Vec<Row>>;
}

/// A database connection: creates cursors and commits.
///
/// `sync` and `close` are optional capabilities; callers check
/// `supports_sync` / `supports_close` before invoking them.
pub trait Connection {
    type Cursor: Cursor;

    fn cursor(&mut self) -> Result<Self::Cursor>;

    fn commit(&mut self) -> Result<()>;

    fn supports_sync(&self) -> bool {
        false
    }

    /// Flush committed state to durable storage.
    fn sync(&mut self) -> Result<()> {
        Err(Error::Unsupported("sync"))
    }

    fn supports_close(&self) -> bool {
        false
    }

    fn close(&mut self) -> Result<()> {
        Err(Error::Unsupported("close"))
    }
}
