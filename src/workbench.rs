//! Workbench
//!
//! Ties the connection, the loaded table and the edit gate together. All
//! database work the UI asks for goes through here, one operation at a time.

use crate::config::ConnectionParameters;
use crate::db::connection::ConnectionManager;
use crate::db::query::build_update;
use crate::db::schema::{TableDescriptor, list_owned_tables};
use crate::db::session::{Connector, Session};
use crate::edit_gate::{CellChange, EditGate, GateDecision, GridEvent};
use crate::error::{DbError, DbResult};
use crate::loader::{self, LoadRequest, LoadedTable};

/// Result of feeding a grid event through the workbench
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// An edit gesture armed the gate
    Armed,
    /// The change was written and committed
    Saved { rows_affected: u64 },
    /// The change arrived without a preceding edit gesture
    Rejected,
}

pub struct Workbench<C: Connector> {
    connections: ConnectionManager<C>,
    gate: EditGate,
    /// Owner whose tables are listed (the user of the live session)
    owner: Option<String>,
    /// Last successfully loaded table; edits are written against it
    table: Option<TableDescriptor>,
}

impl<C: Connector> Workbench<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connections: ConnectionManager::new(connector),
            gate: EditGate::new(),
            owner: None,
            table: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connections.is_connected()
    }

    pub fn current_table(&self) -> Option<&TableDescriptor> {
        self.table.as_ref()
    }

    pub fn gate(&self) -> &EditGate {
        &self.gate
    }

    /// Connect with `params`, replacing any live session.
    ///
    /// A validation failure leaves everything as it was. Any other outcome
    /// forgets the previous table and edit permission.
    pub async fn connect(&mut self, params: &ConnectionParameters) -> DbResult<()> {
        let result = self.connections.connect(params).await;
        if let Err(e) = &result
            && e.is_validation()
        {
            return result;
        }

        self.gate.disarm();
        self.table = None;
        self.owner = result.is_ok().then(|| params.user.clone());
        result
    }

    /// Names of the tables owned by the connected user
    pub async fn refresh_tables(&mut self) -> DbResult<Vec<String>> {
        let owner = self.owner.clone().ok_or(DbError::NotConnected)?;
        let session = self.connections.active().ok_or(DbError::NotConnected)?;

        match list_owned_tables(session, &owner).await {
            Ok(tables) => {
                session.commit().await?;
                tracing::info!(owner = %owner, count = tables.len(), "tables listed");
                Ok(tables)
            }
            Err(e) => {
                if let Err(rollback_err) = session.rollback().await {
                    tracing::debug!(error = %rollback_err, "rollback after failed table list");
                }
                Err(e)
            }
        }
    }

    /// (Re)load a table.
    ///
    /// Always disarms the gate first. Returns `Ok(None)` without touching the
    /// database when there is no live session, and an empty table without a
    /// SELECT when no table name is given. On failure the previously loaded
    /// table stays the edit target.
    pub async fn load_table(&mut self, request: &LoadRequest) -> DbResult<Option<LoadedTable>> {
        self.gate.disarm();

        let Some(session) = self.connections.active() else {
            tracing::debug!("load skipped: not connected");
            return Ok(None);
        };

        if request.table.is_empty() {
            self.table = None;
            return Ok(Some(LoadedTable::default()));
        }

        let loaded = loader::load_table(session, request).await?;
        self.table = Some(loaded.table.clone());
        Ok(Some(loaded))
    }

    /// Feed a grid gesture through the edit gate, persisting an admitted change
    pub async fn handle_grid_event(&mut self, event: GridEvent) -> DbResult<EditOutcome> {
        match (self.gate.on_event(&event), event) {
            (GateDecision::Armed, _) => Ok(EditOutcome::Armed),
            (GateDecision::Persist, GridEvent::CellChanged(change)) => self.persist(&change).await,
            _ => Ok(EditOutcome::Rejected),
        }
    }

    async fn persist(&mut self, change: &CellChange) -> DbResult<EditOutcome> {
        let table = self.table.as_ref().ok_or_else(|| {
            DbError::QueryFailed("no table is loaded".to_string())
        })?;
        let column = table.columns.get(change.column).ok_or_else(|| {
            DbError::QueryFailed(format!(
                "column {} does not exist in {}",
                change.column, table.name
            ))
        })?;
        let statement = build_update(&table.name, column, &change.value, &change.row_id);

        let session = self.connections.active().ok_or(DbError::NotConnected)?;
        match session.execute(&statement).await {
            Ok(rows_affected) => {
                session.commit().await?;
                tracing::info!(
                    table = %table.name,
                    column = %column,
                    id = %change.row_id,
                    rows_affected,
                    "cell saved"
                );
                Ok(EditOutcome::Saved { rows_affected })
            }
            Err(e) => {
                if let Err(rollback_err) = session.rollback().await {
                    tracing::debug!(error = %rollback_err, "rollback after failed update");
                }
                tracing::warn!(table = %table.name, column = %column, error = %e, "cell save failed");
                Err(e)
            }
        }
    }

    /// Close the live session, if any
    pub async fn shutdown(&mut self) {
        self.gate.disarm();
        self.connections.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::{MockConnector, MockDb};
    use crate::db::types::CellValue;
    use crate::edit_gate::GateState;

    fn shop() -> MockDb {
        MockDb::new().with_table(
            "t",
            &["id", "b"],
            vec![
                vec![CellValue::Integer(42), CellValue::Text("old".to_string())],
                vec![CellValue::Integer(7), CellValue::Text("x".to_string())],
            ],
        )
    }

    fn params() -> ConnectionParameters {
        ConnectionParameters::new("shop", "alice", "secret", "localhost")
    }

    fn request(table: &str) -> LoadRequest {
        LoadRequest {
            table: table.to_string(),
            ..Default::default()
        }
    }

    fn change(column: usize, value: &str, row_id: &str) -> GridEvent {
        GridEvent::CellChanged(CellChange {
            row: 0,
            column,
            value: value.to_string(),
            row_id: row_id.to_string(),
        })
    }

    async fn loaded_workbench(db: &MockDb) -> Workbench<MockConnector> {
        let mut wb = Workbench::new(MockConnector::new(db.clone()));
        wb.connect(&params()).await.unwrap();
        wb.load_table(&request("t")).await.unwrap();
        db.clear_log();
        wb
    }

    #[tokio::test]
    async fn test_refresh_tables_lists_owned_tables() {
        let db = shop();
        let mut wb = Workbench::new(MockConnector::new(db.clone()));
        assert_eq!(wb.refresh_tables().await, Err(DbError::NotConnected));

        wb.connect(&params()).await.unwrap();
        assert_eq!(wb.refresh_tables().await.unwrap(), vec!["t"]);
        assert_eq!(db.log().last().map(String::as_str), Some("COMMIT"));
    }

    #[tokio::test]
    async fn test_double_click_then_change_issues_update() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;

        let armed = wb
            .handle_grid_event(GridEvent::CellDoubleClicked { row: 0, column: 1 })
            .await
            .unwrap();
        assert_eq!(armed, EditOutcome::Armed);

        let saved = wb.handle_grid_event(change(1, "newval", "42")).await.unwrap();
        assert_eq!(saved, EditOutcome::Saved { rows_affected: 1 });
        assert_eq!(
            db.log(),
            vec!["UPDATE \"t\" SET \"b\" = 'newval' WHERE \"id\" = '42'", "COMMIT"]
        );
        assert_eq!(wb.gate().state(), GateState::Idle);
    }

    #[tokio::test]
    async fn test_change_without_gesture_writes_nothing() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;

        let outcome = wb.handle_grid_event(change(1, "pasted", "42")).await.unwrap();
        assert_eq!(outcome, EditOutcome::Rejected);
        assert!(db.log().is_empty());
    }

    #[tokio::test]
    async fn test_reload_disarms_gate() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;

        wb.handle_grid_event(GridEvent::CellDoubleClicked { row: 0, column: 1 })
            .await
            .unwrap();
        wb.load_table(&request("t")).await.unwrap();
        db.clear_log();

        let outcome = wb.handle_grid_event(change(1, "late", "42")).await.unwrap();
        assert_eq!(outcome, EditOutcome::Rejected);
        assert!(db.log().is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back_and_disarms() {
        let db = shop().failing_on("UPDATE");
        let mut wb = loaded_workbench(&db).await;

        wb.handle_grid_event(GridEvent::CellDoubleClicked { row: 0, column: 1 })
            .await
            .unwrap();
        let err = wb.handle_grid_event(change(1, "boom", "42")).await.unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
        assert_eq!(db.log().last().map(String::as_str), Some("ROLLBACK"));
        assert!(!wb.gate().is_armed());
    }

    #[tokio::test]
    async fn test_update_matching_no_row_is_still_saved() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;
        db.set_rows_affected(0);

        wb.handle_grid_event(GridEvent::CellDoubleClicked { row: 0, column: 1 })
            .await
            .unwrap();
        let outcome = wb.handle_grid_event(change(1, "v", "999")).await.unwrap();
        assert_eq!(outcome, EditOutcome::Saved { rows_affected: 0 });
    }

    #[tokio::test]
    async fn test_load_without_session_does_nothing() {
        let db = shop();
        let mut wb = Workbench::new(MockConnector::new(db.clone()));

        assert_eq!(wb.load_table(&request("t")).await.unwrap(), None);
        assert!(db.log().is_empty());
    }

    #[tokio::test]
    async fn test_empty_table_name_clears_without_select() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;

        let loaded = wb.load_table(&request("")).await.unwrap().unwrap();
        assert!(loaded.rows.is_empty());
        assert!(wb.current_table().is_none());
        assert!(db.log().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_edit_target() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;

        assert!(wb.load_table(&request("missing")).await.is_err());
        assert_eq!(wb.current_table().map(|t| t.name.as_str()), Some("t"));
    }

    #[tokio::test]
    async fn test_reconnect_forgets_table() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;

        db.refuse_connections();
        assert!(wb.connect(&params()).await.is_err());
        assert!(!wb.is_connected());
        assert!(wb.current_table().is_none());
        assert_eq!(wb.refresh_tables().await, Err(DbError::NotConnected));
    }

    #[tokio::test]
    async fn test_invalid_params_keep_session() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;

        let mut bad = params();
        bad.database.clear();
        assert_eq!(
            wb.connect(&bad).await,
            Err(DbError::MissingField("database"))
        );
        assert!(wb.is_connected());
        assert!(wb.current_table().is_some());
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let db = shop();
        let mut wb = loaded_workbench(&db).await;
        wb.shutdown().await;
        assert_eq!(db.log(), vec!["CLOSE"]);
        assert!(!wb.is_connected());
    }
}
