//! Row module - converts SQLite rows into positional JSON tuples

use rusqlite::types::ValueRef;
use serde_json::{Number, Value};

/// A single result row, one value per column in select order.
pub type Row = Vec<Value>;

/// Convert one SQLite column to a JSON value
///
/// Blobs are returned as standard base64 text.
pub fn sqlite_to_json(row: &rusqlite::Row<'_>, i: usize) -> rusqlite::Result<Value> {
    Ok(match row.get_ref(i)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            b,
        )),
    })
}

/// Materialize a whole row as a tuple of `column_count` values
pub fn sqlite_row(row: &rusqlite::Row<'_>, column_count: usize) -> rusqlite::Result<Row> {
    (0..column_count).map(|i| sqlite_to_json(row, i)).collect()
}
