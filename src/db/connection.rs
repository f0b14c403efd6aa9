//! Connection manager
//!
//! Owns the single live session. Connecting validates the parameters, closes
//! whatever session was open, then opens a new one. If the new attempt fails
//! there is no session at all: callers treat "session present" as the only
//! source of truth for being connected.

use crate::config::ConnectionParameters;
use crate::db::session::{Connector, Session};
use crate::error::DbResult;

pub struct ConnectionManager<C: Connector> {
    connector: C,
    session: Option<C::Session>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            session: None,
        }
    }

    /// Replace the active session with a new one built from `params`.
    ///
    /// Validation failures return before anything is closed or opened.
    pub async fn connect(&mut self, params: &ConnectionParameters) -> DbResult<()> {
        params.validate()?;
        self.disconnect().await;

        tracing::info!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            user = %params.user,
            ssl_mode = params.ssl_mode.as_str(),
            "connecting"
        );
        match self.connector.open(params).await {
            Ok(session) => {
                tracing::info!(target = %params.display_name(), "connected");
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "connection attempt failed");
                Err(e)
            }
        }
    }

    /// Close the active session, if any. Close failures are logged only.
    pub async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::debug!(error = %e, "closing previous session failed");
            } else {
                tracing::debug!("previous session closed");
            }
        }
    }

    /// The open session, unless its connection has dropped
    pub fn active(&mut self) -> Option<&mut C::Session> {
        self.session.as_mut().filter(|s| !s.is_closed())
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::{MockConnector, MockDb};
    use crate::error::DbError;

    fn params() -> ConnectionParameters {
        ConnectionParameters::new("shop", "alice", "", "localhost")
    }

    #[tokio::test]
    async fn test_connect_opens_session() {
        let db = MockDb::new();
        let mut manager = ConnectionManager::new(MockConnector::new(db.clone()));
        assert!(!manager.is_connected());

        manager.connect(&params()).await.unwrap();
        assert!(manager.is_connected());
        assert_eq!(db.log(), vec!["OPEN alice@localhost/shop"]);
    }

    #[tokio::test]
    async fn test_reconnect_closes_previous_session() {
        let db = MockDb::new();
        let mut manager = ConnectionManager::new(MockConnector::new(db.clone()));
        manager.connect(&params()).await.unwrap();
        manager.connect(&params()).await.unwrap();

        assert_eq!(
            db.log(),
            vec![
                "OPEN alice@localhost/shop",
                "CLOSE",
                "OPEN alice@localhost/shop"
            ]
        );
    }

    #[tokio::test]
    async fn test_validation_failure_keeps_existing_session() {
        let db = MockDb::new();
        let mut manager = ConnectionManager::new(MockConnector::new(db.clone()));
        manager.connect(&params()).await.unwrap();

        let mut bad = params();
        bad.host = "  ".to_string();
        let err = manager.connect(&bad).await.unwrap_err();
        assert_eq!(err, DbError::MissingField("host"));
        assert!(manager.is_connected());
        assert_eq!(db.log().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_no_session() {
        let db = MockDb::new();
        let mut manager = ConnectionManager::new(MockConnector::new(db.clone()));
        manager.connect(&params()).await.unwrap();

        db.refuse_connections();
        let err = manager.connect(&params()).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
        assert!(!manager.is_connected());
        assert!(manager.active().is_none());
    }

    #[tokio::test]
    async fn test_dropped_connection_is_not_active() {
        let db = MockDb::new();
        let mut manager = ConnectionManager::new(MockConnector::new(db.clone()));
        manager.connect(&params()).await.unwrap();

        db.drop_connection();
        assert!(!manager.is_connected());
        assert!(manager.active().is_none());
    }
}
