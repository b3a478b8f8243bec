//! Database module - the driver seam and its SQLite implementation

mod config;
mod cursor;
mod database;
mod driver;
mod params;
mod row;

pub use config::{JournalMode, SqliteConfig, Synchronous, TempStore, TransactionMode};
pub use cursor::SqliteCursor;
pub use database::{ColumnInfo, SqliteConnection};
pub use driver::{Connection, Cursor};
pub use params::{convert_params, convert_single_param, ParameterSet};
pub use row::{sqlite_to_json, Row};
