//! Named statement registry and result wrapper over a database connection.
//!
//! [`Decibel`] holds a cursor and a map of statement ids to SQL, executes
//! raw or registered statements (once, or once per parameter set), wraps
//! each execution in an [`ExecutionResult`], and commits after every call.

pub mod db;
mod error;
mod models;
mod registry;

pub use db::{
    ColumnInfo, Connection, Cursor, JournalMode, ParameterSet, Row, SqliteConfig,
    SqliteConnection, SqliteCursor, Synchronous, TempStore, TransactionMode,
};
pub use error::{Error, Result};
pub use models::{BatchResult, ExecutionResult, Outcome};
pub use registry::Decibel;

/// Version of the linked SQLite library
pub fn sqlite_version() -> String {
    rusqlite::version().to_string()
}
