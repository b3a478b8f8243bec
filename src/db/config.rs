//! Config module - open-time settings for the SQLite driver

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `BEGIN` flavour used for implicit transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    #[default]
    Deferred,
    Immediate,
    Exclusive,
}

impl TransactionMode {
    pub(crate) fn begin_sql(self) -> &'static str {
        match self {
            TransactionMode::Deferred => "BEGIN DEFERRED",
            TransactionMode::Immediate => "BEGIN IMMEDIATE",
            TransactionMode::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

/// `PRAGMA journal_mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    fn as_pragma(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// `PRAGMA synchronous` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Synchronous {
    Off,
    Normal,
    Full,
    Extra,
}

impl Synchronous {
    fn as_pragma(self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
            Synchronous::Extra => "EXTRA",
        }
    }
}

/// `PRAGMA temp_store` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TempStore {
    Default,
    File,
    Memory,
}

impl TempStore {
    fn as_pragma(self) -> &'static str {
        match self {
            TempStore::Default => "DEFAULT",
            TempStore::File => "FILE",
            TempStore::Memory => "MEMORY",
        }
    }
}

/// PRAGMAs and transaction behaviour applied when a database is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub journal_mode: JournalMode,
    pub synchronous: Synchronous,
    pub cache_size: i64,
    pub temp_store: TempStore,
    pub mmap_size: i64,
    pub foreign_keys: bool,
    pub busy_timeout_ms: Option<u64>,
    /// Open a transaction before data modification statements so that
    /// `commit` has something to commit.
    pub implicit_transactions: bool,
    pub transaction_mode: TransactionMode,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        SqliteConfig {
            journal_mode: JournalMode::Wal,
            synchronous: Synchronous::Normal,
            cache_size: -64000,
            temp_store: TempStore::Memory,
            mmap_size: 268435456,
            foreign_keys: true,
            busy_timeout_ms: None,
            implicit_transactions: true,
            transaction_mode: TransactionMode::Deferred,
        }
    }
}

impl SqliteConfig {
    /// Parse a config from JSON; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub(crate) fn pragma_script(&self) -> String {
        format!(
            "PRAGMA journal_mode = {};
             PRAGMA synchronous = {};
             PRAGMA cache_size = {};
             PRAGMA temp_store = {};
             PRAGMA mmap_size = {};
             PRAGMA foreign_keys = {};",
            self.journal_mode.as_pragma(),
            self.synchronous.as_pragma(),
            self.cache_size,
            self.temp_store.as_pragma(),
            self.mmap_size,
            if self.foreign_keys { "ON" } else { "OFF" },
        )
    }
}
