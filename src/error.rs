use thiserror::Error;

/// Result type for all decibel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the dispatcher and the bundled SQLite driver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("SQLite Error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failure reported by a non-SQLite `Connection` implementation.
    #[error("Driver Error: {0}")]
    Driver(String),
    #[error("DB Lock failed")]
    Lock,
    #[error("database connection is closed")]
    Closed,
    /// The cursor has no pending result set to fetch from.
    #[error("no result set pending on cursor")]
    NoResultSet,
    /// A bind value SQLite cannot store without loss.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("connection does not support {0}")]
    Unsupported(&'static str),
    /// Malformed statement catalog or configuration document.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}
