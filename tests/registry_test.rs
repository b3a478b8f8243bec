//! Tests for statement dispatch, commit counting and shutdown
//! Run with: cargo test --test registry_test

use decibel::{Connection, Cursor, Decibel, Error, ExecutionResult, Outcome, Result, Row};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Everything the fake driver was asked to do, in call order.
#[derive(Default)]
struct Journal {
    executions: Vec<(String, Vec<Value>)>,
    events: Vec<&'static str>,
}

type SharedJournal = Rc<RefCell<Journal>>;

/// Cursor that returns two rows for SELECTs and inserts one row otherwise.
/// A bind value of `"boom"` makes execute fail.
struct RecordingCursor {
    journal: SharedJournal,
    pending: Option<Vec<Row>>,
    row_count: i64,
    last_insert_id: i64,
}

impl Cursor for RecordingCursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        if params.contains(&json!("boom")) {
            return Err(Error::Driver("constraint failed".to_string()));
        }
        let mut journal = self.journal.borrow_mut();
        journal.executions.push((sql.to_string(), params.to_vec()));
        journal.events.push("execute");

        if sql.starts_with("SELECT") {
            self.pending = Some(vec![vec![json!(1), json!("a")], vec![json!(2), json!("b")]]);
            self.row_count = -1;
        } else {
            self.pending = None;
            self.row_count = 1;
            self.last_insert_id += 1;
        }
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

struct RecordingConnection {
    journal: SharedJournal,
    durable: bool,
}

impl RecordingConnection {
    fn minimal() -> Self {
        RecordingConnection {
            journal: SharedJournal::default(),
            durable: false,
        }
    }

    fn durable() -> Self {
        RecordingConnection {
            journal: SharedJournal::default(),
            durable: true,
        }
    }

    /// Driver-specific method, reached through the wrapper by delegation
    fn commit_count(&self) -> usize {
        self.events().iter().filter(|e| **e == "commit").count()
    }

    fn events(&self) -> Vec<&'static str> {
        self.journal.borrow().events.clone()
    }

    fn executions(&self) -> Vec<(String, Vec<Value>)> {
        self.journal.borrow().executions.clone()
    }
}

impl Connection for RecordingConnection {
    type Cursor = RecordingCursor;

    fn cursor(&mut self) -> Result<RecordingCursor> {
        Ok(RecordingCursor {
            journal: self.journal.clone(),
            pending: None,
            row_count: -1,
            last_insert_id: 0,
        })
    }

    fn commit(&mut self) -> Result<()> {
        self.journal.borrow_mut().events.push("commit");
        Ok(())
    }

    fn supports_sync(&self) -> bool {
        self.durable
    }

    fn sync(&mut self) -> Result<()> {
        self.journal.borrow_mut().events.push("sync");
        Ok(())
    }

    fn supports_close(&self) -> bool {
        self.durable
    }

    fn close(&mut self) -> Result<()> {
        self.journal.borrow_mut().events.push("close");
        Ok(())
    }
}

fn recording_db() -> Decibel<RecordingConnection> {
    Decibel::new(RecordingConnection::minimal()).unwrap()
}

mod execute_tests {
    use super::*;

    #[test]
    fn test_no_params_returns_single_result() {
        let mut db = recording_db();
        let outcome = db.execute("SELECT v, w FROM t", None, false).unwrap();

        let result = outcome.into_single().unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], vec![json!(1), json!("a")]);
        assert_eq!(result.row_count(), -1);
        assert_eq!(db.commit_count(), 1);
        assert_eq!(db.executions(), vec![("SELECT v, w FROM t".to_string(), vec![])]);
    }

    #[test]
    fn test_params_bound_as_one_sequence() {
        let mut db = recording_db();
        let outcome = db
            .execute("INSERT INTO t(v, w) VALUES (?, ?)", Some(vec![json!(7), json!("x")]), false)
            .unwrap();

        let result = outcome.as_single().unwrap();
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.last_insert_id(), 1);
        assert_eq!(db.executions()[0].1, vec![json!(7), json!("x")]);
        assert_eq!(db.events(), vec!["execute", "commit"]);
    }

    #[test]
    fn test_batch_returns_one_result_per_set_and_commits_once() {
        let mut db = recording_db();
        let outcome = db
            .execute("INSERT INTO t(v) VALUES (?)", Some(vec![json!(1), json!(2), json!(3)]), true)
            .unwrap();

        let results = outcome.into_batch().unwrap();
        assert_eq!(results.len(), 3);
        let ids: Vec<i64> = results.iter().map(ExecutionResult::last_insert_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(results.iter().all(|r| r.row_count() == 1));
        assert_eq!(db.events(), vec!["execute", "execute", "execute", "commit"]);
    }

    #[test]
    fn test_batch_wraps_scalars_and_keeps_sequences() {
        let mut db = recording_db();
        db.execute(
            "INSERT INTO t(v, w) VALUES (?, ?)",
            Some(vec![json!([1, "a"]), json!(2), json!(null)]),
            true,
        )
        .unwrap();

        let bound: Vec<Vec<Value>> = db.executions().into_iter().map(|(_, p)| p).collect();
        assert_eq!(
            bound,
            vec![vec![json!(1), json!("a")], vec![json!(2)], vec![json!(null)]]
        );
    }

    #[test]
    fn test_batch_results_keep_their_own_rows() {
        let mut db = recording_db();
        let results = db.execute_many("SELECT v, w FROM t WHERE v > ?", [json!(0), json!(1)]).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].len(), 2);
        assert_eq!(results[1].len(), 2);
        assert_eq!(db.commit_count(), 1);
    }

    #[test]
    fn test_empty_batch_still_commits() {
        let mut db = recording_db();
        let outcome = db.execute("INSERT INTO t(v) VALUES (?)", Some(vec![]), true).unwrap();

        assert!(outcome.is_empty());
        assert!(db.executions().is_empty());
        assert_eq!(db.commit_count(), 1);
    }

    #[test]
    fn test_failure_mid_batch_propagates_without_commit() {
        let mut db = recording_db();
        let err = db
            .execute("INSERT INTO t(v) VALUES (?)", Some(vec![json!(1), json!("boom"), json!(3)]), true)
            .unwrap_err();

        assert!(matches!(err, Error::Driver(_)));
        assert_eq!(db.executions().len(), 1);
        assert_eq!(db.commit_count(), 0);
    }

    #[test]
    fn test_execute_once_commits() {
        let mut db = recording_db();
        let result = db.execute_once("UPDATE t SET v = ?", &[json!(5)]).unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(db.commit_count(), 1);
    }
}

mod registry_tests {
    use super::*;

    #[test]
    fn test_register_overwrites() {
        let mut db = recording_db();
        db.register("q", "SELECT 1");
        db.register("q", "SELECT v, w FROM t");

        db.run_registered("q", None, false).unwrap();
        assert_eq!(db.statement("q"), Some("SELECT v, w FROM t"));
        assert_eq!(db.executions()[0].0, "SELECT v, w FROM t");
    }

    #[test]
    fn test_register_all_combines_forms() {
        let mut db = recording_db();
        let mut map = HashMap::new();
        map.insert("a".to_string(), "SELECT a".to_string());
        db.register_all(map.into_iter().chain([("b".to_string(), "SELECT b".to_string())]));
        db.register_all([("c", "SELECT c")]);

        assert_eq!(db.statements().len(), 3);
        assert!(db.contains("a") && db.contains("b") && db.contains("c"));
    }

    #[test]
    fn test_with_statements_seeds_registry() {
        let db = Decibel::with_statements(
            RecordingConnection::minimal(),
            [("ins", "INSERT INTO t(v) VALUES (?)")],
        )
        .unwrap();

        assert_eq!(db.statement("ins"), Some("INSERT INTO t(v) VALUES (?)"));
    }

    #[test]
    fn test_register_json() {
        let mut db = recording_db();
        db.register_json(r#"{"all": "SELECT v, w FROM t", "ins": "INSERT INTO t(v) VALUES (?)"}"#)
            .unwrap();

        assert_eq!(db.statements().len(), 2);
        assert_eq!(db.statement("all"), Some("SELECT v, w FROM t"));
    }

    #[test]
    fn test_register_json_rejects_malformed_catalog() {
        let mut db = recording_db();
        let err = db.register_json(r#"{"all": 1}"#).unwrap_err();

        assert!(matches!(err, Error::Json(_)));
        assert!(db.statements().is_empty());
    }

    #[test]
    fn test_run_registered_batch() {
        let mut db = recording_db();
        db.register_all([("ins", "INSERT INTO t(v) VALUES (?)")]);

        let outcome = db
            .run_registered("ins", Some(vec![json!(1), json!(2), json!(3)]), true)
            .unwrap();

        let results = outcome.as_batch().unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.row_count() == 1));
        assert_eq!(db.commit_count(), 1);
    }

    #[test]
    fn test_unknown_id_is_empty_and_untouched() {
        let mut db = recording_db();
        let outcome = db.run_registered("missing", Some(vec![json!(1)]), true).unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome, Outcome::default());
        assert!(db.events().is_empty());
    }
}

mod result_tests {
    use super::*;

    #[test]
    fn test_capture_without_result_set() {
        let mut conn = RecordingConnection::minimal();
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("DELETE FROM t", &[]).unwrap();

        let result = ExecutionResult::capture(&mut cursor);
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.last_insert_id(), 1);
    }

    #[test]
    fn test_capture_drains_rows() {
        let mut conn = RecordingConnection::minimal();
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("SELECT v, w FROM t", &[]).unwrap();

        let first = ExecutionResult::capture(&mut cursor);
        let second = ExecutionResult::capture(&mut cursor);
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(second.row_count(), -1);
    }

    #[test]
    fn test_result_iterates_in_order() {
        let mut conn = RecordingConnection::minimal();
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("SELECT v, w FROM t", &[]).unwrap();
        let result = ExecutionResult::capture(&mut cursor);

        let firsts: Vec<&Value> = result.iter().map(|row| &row[0]).collect();
        assert_eq!(firsts, vec![&json!(1), &json!(2)]);
        assert_eq!(result.into_rows().len(), 2);
    }

    #[test]
    fn test_result_serializes_metadata() {
        let mut db = recording_db();
        let result = db.execute_once("INSERT INTO t(v) VALUES (?)", &[json!(1)]).unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"rows": [], "row_count": 1, "last_insert_id": 1}));
    }
}

mod shutdown_tests {
    use super::*;

    #[test]
    fn test_shutdown_without_capabilities_only_commits() {
        let conn = RecordingConnection::minimal();
        let journal = conn.journal.clone();
        let db = Decibel::new(conn).unwrap();

        db.shutdown().unwrap();
        assert_eq!(journal.borrow().events, vec!["commit"]);
    }

    #[test]
    fn test_shutdown_commits_syncs_closes_in_order() {
        let conn = RecordingConnection::durable();
        let journal = conn.journal.clone();
        let db = Decibel::new(conn).unwrap();

        db.shutdown().unwrap();
        assert_eq!(journal.borrow().events, vec!["commit", "sync", "close"]);
    }

    #[test]
    fn test_unsupported_capability_errors_when_called_directly() {
        struct Bare;
        struct BareCursor;

        impl Cursor for BareCursor {
            fn execute(&mut self, _sql: &str, _params: &[Value]) -> Result<()> {
                Ok(())
            }
            fn row_count(&self) -> i64 {
                -1
            }
            fn last_insert_id(&self) -> i64 {
                0
            }
            fn fetch_all(&mut self) -> Result<Vec<Row>> {
                Err(Error::NoResultSet)
            }
        }

        impl Connection for Bare {
            type Cursor = BareCursor;
            fn cursor(&mut self) -> Result<BareCursor> {
                Ok(BareCursor)
            }
            fn commit(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let mut bare = Bare;
        assert!(!bare.supports_sync());
        assert!(matches!(bare.sync(), Err(Error::Unsupported("sync"))));
        assert!(matches!(bare.close(), Err(Error::Unsupported("close"))));
        Decibel::new(bare).unwrap().shutdown().unwrap();
    }
}
