//! Database session traits
//!
//! Defines the interface the rest of the application talks to. This
//! abstraction allows for:
//! - A real PostgreSQL backend ([`crate::db::postgres`])
//! - Easy testing with in-memory recording sessions
//!
//! Sessions follow the classic driver model: the first statement opens a
//! transaction implicitly, and it stays open until [`Session::commit`] or
//! [`Session::rollback`].

use crate::config::ConnectionParameters;
use crate::db::query::Statement;
use crate::db::types::Row;
use crate::error::DbResult;

/// One open handle to a database
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Run a row-returning statement
    ///
    /// # Errors
    /// Returns `DbError::QueryFailed` if execution fails
    async fn query(&mut self, statement: &Statement) -> DbResult<Vec<Row>>;

    /// Run a statement and return the number of affected rows
    ///
    /// # Errors
    /// Returns `DbError::QueryFailed` if execution fails
    async fn execute(&mut self, statement: &Statement) -> DbResult<u64>;

    /// Commit the open transaction, if any
    async fn commit(&mut self) -> DbResult<()>;

    /// Roll back the open transaction, if any
    async fn rollback(&mut self) -> DbResult<()>;

    /// Whether the underlying connection has gone away
    fn is_closed(&self) -> bool;

    /// Close the session
    async fn close(self) -> DbResult<()>
    where
        Self: Sized;
}

/// Opens sessions from connection parameters
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Session: Session;

    /// Establish a new session
    ///
    /// # Errors
    /// Returns `DbError::ConnectionFailed` with the full diagnostic report
    async fn open(&self, params: &ConnectionParameters) -> DbResult<Self::Session>;
}
