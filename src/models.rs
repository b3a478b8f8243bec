use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::db::{Cursor, Row};

/// Snapshot of one cursor execution: its rows plus the driver's metadata.
///
/// Behaves as a read-only slice of rows. `row_count` and `last_insert_id`
/// are passed through from the driver without normalization, so their
/// meaning for non-DML statements is whatever the driver reports.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    rows: Vec<Row>,
    row_count: i64,
    last_insert_id: i64,
}

/// One [`ExecutionResult`] per parameter set, in input order.
pub type BatchResult = Vec<ExecutionResult>;

impl ExecutionResult {
    /// Capture the outcome of the cursor's last execution.
    ///
    /// Metadata is read before rows are drained. A failed fetch yields an
    /// empty row sequence instead of an error.
    pub fn capture<K: Cursor + ?Sized>(cursor: &mut K) -> Self {
        let row_count = cursor.row_count();
        let last_insert_id = cursor.last_insert_id();
        let rows = match cursor.fetch_all() {
            Ok(rows) => rows,
            Err(e) => {
                debug!("no rows captured: {}", e);
                Vec::new()
            }
        };
        ExecutionResult {
            rows,
            row_count,
            last_insert_id,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> i64 {
        self.row_count
    }

    pub fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl Deref for ExecutionResult {
    type Target = [Row];

    fn deref(&self) -> &[Row] {
        &self.rows
    }
}

impl IntoIterator for ExecutionResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExecutionResult {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// What an execute call hands back: one result, or one per parameter set.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Outcome {
    Single(ExecutionResult),
    Batch(BatchResult),
}

impl Default for Outcome {
    fn default() -> Self {
        Outcome::Batch(Vec::new())
    }
}

impl Outcome {
    /// Row count of a single result, or number of results in a batch
    pub fn len(&self) -> usize {
        match self {
            Outcome::Single(result) => result.len(),
            Outcome::Batch(results) => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_single(&self) -> Option<&ExecutionResult> {
        match self {
            Outcome::Single(result) => Some(result),
            Outcome::Batch(_) => None,
        }
    }

    pub fn as_batch(&self) -> Option<&[ExecutionResult]> {
        match self {
            Outcome::Batch(results) => Some(results),
            Outcome::Single(_) => None,
        }
    }

    pub fn into_single(self) -> Option<ExecutionResult> {
        match self {
            Outcome::Single(result) => Some(result),
            Outcome::Batch(_) => None,
        }
    }

    pub fn into_batch(self) -> Option<BatchResult> {
        match self {
            Outcome::Batch(results) => Some(results),
            Outcome::Single(_) => None,
        }
    }
}
