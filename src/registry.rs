//! Registry module - named statements and the execute/commit dispatcher

use log::{debug, info, trace};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use crate::db::{Connection, Cursor, ParameterSet};
use crate::error::Result;
use crate::models::{BatchResult, ExecutionResult, Outcome};

/// Statement registry and dispatcher over a single connection.
///
/// Owns one cursor for its whole lifetime and commits once after every
/// execute call. Methods of the wrapped connection are reachable through
/// `Deref`, or explicitly via [`connection`](Self::connection).
///
/// Every operation takes `&mut self`: the shared cursor is overwritten on
/// each execution, so only one call may be in flight per instance.
pub struct Decibel<C: Connection> {
    connection: C,
    cursor: C::Cursor,
    statements: HashMap<String, String>,
}

impl<C: Connection> Decibel<C> {
    /// Wrap `connection` with an empty registry
    pub fn new(connection: C) -> Result<Self> {
        Self::with_statements(connection, HashMap::<String, String>::new())
    }

    /// Wrap `connection` and seed the registry with `statements`
    pub fn with_statements<I, K, V>(mut connection: C, statements: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let cursor = connection.cursor()?;
        let mut decibel = Decibel {
            connection,
            cursor,
            statements: HashMap::new(),
        };
        decibel.register_all(statements);
        Ok(decibel)
    }

    /// Register one statement, replacing any previous text for `id`.
    ///
    /// SQL is not validated; errors surface when the statement is executed.
    pub fn register(&mut self, id: impl Into<String>, sql: impl Into<String>) {
        self.statements.insert(id.into(), sql.into());
    }

    /// Merge any collection of `(id, sql)` pairs into the registry
    pub fn register_all<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.statements.extend(
            entries
                .into_iter()
                .map(|(id, sql)| (id.into(), sql.into())),
        );
    }

    /// Merge a JSON object of `id -> sql` pairs.
    ///
    /// Nothing is registered if the document fails to parse.
    pub fn register_json(&mut self, text: &str) -> Result<()> {
        let entries: HashMap<String, String> = serde_json::from_str(text)?;
        debug!("registering {} statements from catalog", entries.len());
        self.register_all(entries);
        Ok(())
    }

    pub fn statement(&self, id: &str) -> Option<&str> {
        self.statements.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.statements.contains_key(id)
    }

    pub fn statements(&self) -> &HashMap<String, String> {
        &self.statements
    }

    /// Execute `sql` and commit.
    ///
    /// - `params == None`: run once without binds.
    /// - `batch == false`: run once binding `params` positionally.
    /// - `batch == true`: run once per element of `params`; an array element
    ///   is bound as-is, any other value as a one-element sequence.
    ///
    /// Exactly one commit is issued, after all executions. Driver errors
    /// propagate unchanged and skip the commit.
    pub fn execute(&mut self, sql: &str, params: Option<Vec<Value>>, batch: bool) -> Result<Outcome> {
        let outcome = match params {
            None => Outcome::Single(self.execute_uncommitted(sql, &[])?),
            Some(values) if !batch => Outcome::Single(self.execute_uncommitted(sql, &values)?),
            Some(values) => {
                let sets = values.into_iter().map(ParameterSet::from);
                Outcome::Batch(self.execute_batch_uncommitted(sql, sets)?)
            }
        };
        self.commit_connection()?;
        Ok(outcome)
    }

    /// Execute `sql` once with positional `params` and commit
    pub fn execute_once(&mut self, sql: &str, params: &[Value]) -> Result<ExecutionResult> {
        let result = self.execute_uncommitted(sql, params)?;
        self.commit_connection()?;
        Ok(result)
    }

    /// Execute `sql` once per parameter set, then commit once
    pub fn execute_many<I, P>(&mut self, sql: &str, sets: I) -> Result<BatchResult>
    where
        I: IntoIterator<Item = P>,
        P: Into<ParameterSet>,
    {
        let results = self.execute_batch_uncommitted(sql, sets.into_iter().map(Into::into))?;
        self.commit_connection()?;
        Ok(results)
    }

    /// Execute a registered statement.
    ///
    /// An unknown `id` is not an error: it returns an empty outcome and
    /// leaves the cursor and transaction untouched.
    pub fn run_registered(&mut self, id: &str, params: Option<Vec<Value>>, batch: bool) -> Result<Outcome> {
        let Some(sql) = self.statements.get(id).cloned() else {
            debug!("statement '{}' is not registered", id);
            return Ok(Outcome::default());
        };
        self.execute(&sql, params, batch)
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Drop the registry and cursor without committing, returning the connection
    pub fn into_connection(self) -> C {
        self.connection
    }

    /// Commit, then sync and close if the connection supports them.
    ///
    /// A missing capability is skipped, never an error.
    pub fn shutdown(mut self) -> Result<()> {
        info!("shutting down connection");
        self.commit_connection()?;

        if self.connection.supports_sync() {
            info!("syncing connection");
            self.connection.sync()?;
        } else {
            debug!("connection has no sync capability");
        }

        if self.connection.supports_close() {
            info!("closing connection");
            self.connection.close()?;
        } else {
            debug!("connection has no close capability");
        }
        Ok(())
    }

    fn execute_uncommitted(&mut self, sql: &str, params: &[Value]) -> Result<ExecutionResult> {
        debug!("execute: {}", sql);
        self.cursor.execute(sql, params)?;
        Ok(ExecutionResult::capture(&mut self.cursor))
    }

    fn execute_batch_uncommitted(
        &mut self,
        sql: &str,
        sets: impl Iterator<Item = ParameterSet>,
    ) -> Result<BatchResult> {
        debug!("execute many: {}", sql);
        let mut results = Vec::new();
        for set in sets {
            self.cursor.execute(sql, &set.into_values())?;
            // capture before the next execution overwrites cursor state
            results.push(ExecutionResult::capture(&mut self.cursor));
        }
        debug!("executed {} parameter sets", results.len());
        Ok(results)
    }

    fn commit_connection(&mut self) -> Result<()> {
        trace!("commit");
        self.connection.commit()
    }
}

impl<C: Connection> Deref for Decibel<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.connection
    }
}

impl<C: Connection> DerefMut for Decibel<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.connection
    }
}
