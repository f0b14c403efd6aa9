//! In-memory session for tests
//!
//! Answers the catalog queries and `SELECT * FROM` statements from scripted
//! tables and records every statement (plus COMMIT/ROLLBACK/OPEN/CLOSE) in a
//! shared log. Used by the unit tests and by the end-to-end tests under
//! `tests/`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ConnectionParameters;
use crate::db::query::{Statement, quote_ident};
use crate::db::session::{Connector, Session};
use crate::db::types::{CellValue, Row};
use crate::error::{DbError, DbResult};

struct MockTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

#[derive(Default)]
struct Inner {
    tables: Vec<MockTable>,
    log: Vec<String>,
    fail_on: Option<String>,
    refuse_connect: bool,
    dropped: bool,
    rows_affected: u64,
}

/// Shared handle to the scripted database; clones see the same state
#[derive(Clone)]
pub struct MockDb {
    inner: Rc<RefCell<Inner>>,
}

impl MockDb {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                rows_affected: 1,
                ..Default::default()
            })),
        }
    }

    pub fn with_table(self, name: &str, columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        self.inner.borrow_mut().tables.push(MockTable {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.into_iter().map(Row::new).collect(),
        });
        self
    }

    /// Fail every statement whose SQL contains `fragment`
    pub fn failing_on(self, fragment: &str) -> Self {
        self.inner.borrow_mut().fail_on = Some(fragment.to_string());
        self
    }

    pub fn refuse_connections(&self) {
        self.inner.borrow_mut().refuse_connect = true;
    }

    pub fn set_rows_affected(&self, n: u64) {
        self.inner.borrow_mut().rows_affected = n;
    }

    /// Simulate the server dropping the connection
    pub fn drop_connection(&self) {
        self.inner.borrow_mut().dropped = true;
    }

    pub fn log(&self) -> Vec<String> {
        self.inner.borrow().log.clone()
    }

    /// Logged entries starting with `prefix`
    pub fn log_starting_with(&self, prefix: &str) -> Vec<String> {
        self.inner
            .borrow()
            .log
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear_log(&self) {
        self.inner.borrow_mut().log.clear();
    }

    fn record(&self, entry: &str) -> DbResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.log.push(entry.to_string());
        match &inner.fail_on {
            Some(fragment) if entry.contains(fragment.as_str()) => {
                Err(DbError::QueryFailed(format!("scripted failure: {entry}")))
            }
            _ => Ok(()),
        }
    }
}

impl Default for MockDb {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MockSession {
    db: MockDb,
}

impl MockSession {
    pub fn new(db: MockDb) -> Self {
        Self { db }
    }
}

impl Session for MockSession {
    async fn query(&mut self, statement: &Statement) -> DbResult<Vec<Row>> {
        self.db.record(&statement.sql)?;
        let inner = self.db.inner.borrow();
        let text_rows = |items: Vec<String>| -> Vec<Row> {
            items
                .into_iter()
                .map(|s| Row::new(vec![CellValue::Text(s)]))
                .collect()
        };

        if statement.sql.contains("pg_tables") {
            return Ok(text_rows(inner.tables.iter().map(|t| t.name.clone()).collect()));
        }
        if statement.sql.contains("pg_attribute") {
            let wanted = statement.params.first().map(String::as_str).unwrap_or("");
            let columns = inner
                .tables
                .iter()
                .find(|t| t.name == wanted)
                .map(|t| t.columns.clone())
                .unwrap_or_default();
            return Ok(text_rows(columns));
        }
        if let Some(rest) = statement.sql.strip_prefix("SELECT * FROM ") {
            return inner
                .tables
                .iter()
                .find(|t| rest.starts_with(&quote_ident(&t.name)))
                .map(|t| t.rows.clone())
                .ok_or_else(|| DbError::QueryFailed(format!("relation {rest} does not exist")));
        }
        Ok(Vec::new())
    }

    async fn execute(&mut self, statement: &Statement) -> DbResult<u64> {
        self.db.record(&statement.sql)?;
        Ok(self.db.inner.borrow().rows_affected)
    }

    async fn commit(&mut self) -> DbResult<()> {
        self.db.record("COMMIT")
    }

    async fn rollback(&mut self) -> DbResult<()> {
        self.db.record("ROLLBACK")
    }

    fn is_closed(&self) -> bool {
        self.db.inner.borrow().dropped
    }

    async fn close(self) -> DbResult<()> {
        self.db.record("CLOSE")
    }
}

pub struct MockConnector {
    db: MockDb,
}

impl MockConnector {
    pub fn new(db: MockDb) -> Self {
        Self { db }
    }
}

impl Connector for MockConnector {
    type Session = MockSession;

    async fn open(&self, params: &ConnectionParameters) -> DbResult<MockSession> {
        self.db.record(&format!("OPEN {}", params.display_name()))?;
        let mut inner = self.db.inner.borrow_mut();
        if inner.refuse_connect {
            return Err(DbError::ConnectionFailed(
                "could not connect to server: Connection refused".to_string(),
            ));
        }
        inner.dropped = false;
        drop(inner);
        Ok(MockSession::new(self.db.clone()))
    }
}
