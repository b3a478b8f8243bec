//! Cursor module - executes statements on a shared SQLite handle

use log::trace;
use rusqlite::{params_from_iter, ToSql};
use serde_json::Value;

use super::config::TransactionMode;
use super::database::{with_conn, SharedConn};
use super::driver::Cursor;
use super::params::convert_params;
use super::row::{sqlite_row, Row};
use crate::error::{Error, Result};

/// Cursor over a [`SqliteConnection`](super::SqliteConnection).
///
/// Query rows are materialized at execute time and held until fetched.
pub struct SqliteCursor {
    conn: SharedConn,
    implicit_begin: Option<TransactionMode>,
    pending: Option<Vec<Row>>,
    row_count: i64,
    last_insert_id: i64,
}

impl SqliteCursor {
    /// Create a new cursor (internal use)
    pub(crate) fn new(conn: SharedConn, implicit_begin: Option<TransactionMode>) -> Self {
        SqliteCursor {
            conn,
            implicit_begin,
            pending: None,
            row_count: -1,
            last_insert_id: 0,
        }
    }
}

impl Cursor for SqliteCursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        self.pending = None;
        let implicit_begin = self.implicit_begin;

        let rusqlite_params = convert_params(params)?;
        let params_refs: Vec<&dyn ToSql> =
            rusqlite_params.iter().map(|p| p as &dyn ToSql).collect();

        let (pending, row_count, last_insert_id) = with_conn(&self.conn, |conn| {
            // prepare first so a malformed statement never leaves a transaction open
            let mut stmt = conn.prepare_cached(sql)?;
            let column_count = stmt.column_count();

            if let Some(mode) = implicit_begin {
                if conn.is_autocommit() && is_data_modification(sql) {
                    trace!("{}", mode.begin_sql());
                    conn.execute_batch(mode.begin_sql())?;
                }
            }

            let (pending, row_count) = if column_count > 0 {
                let mut rows = stmt.query(params_from_iter(params_refs))?;
                let mut results = Vec::new();
                while let Some(row) = rows.next()? {
                    results.push(sqlite_row(row, column_count)?);
                }
                // SQLite has no affected count for queries
                (Some(results), -1)
            } else {
                let changes = stmt.execute(params_from_iter(params_refs))?;
                (None, changes as i64)
            };

            Ok((pending, row_count, conn.last_insert_rowid()))
        })?;

        self.pending = pending;
        self.row_count = row_count;
        self.last_insert_id = last_insert_id;
        Ok(())
    }

    fn row_count(&self) -> i64 {
        self.row_count
    }

    fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.pending.take().ok_or(Error::NoResultSet)
    }
}

/// Whether `sql` starts with a data modification keyword, ignoring
/// leading whitespace and comments.
fn is_data_modification(sql: &str) -> bool {
    let keyword = skip_leading_comments(sql)
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    ["INSERT", "UPDATE", "DELETE", "REPLACE"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

fn skip_leading_comments(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(rest) = sql.strip_prefix("--") {
            sql = rest.find('\n').map_or("", |i| &rest[i + 1..]);
        } else if let Some(rest) = sql.strip_prefix("/*") {
            sql = rest.find("*/").map_or("", |i| &rest[i + 2..]);
        } else {
            return sql;
        }
    }
}
