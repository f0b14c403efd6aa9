//! Action execution
//!
//! Runs the [`Action`]s the app asks for against the [`Workbench`] and feeds
//! each result back as an [`AppEvent`], until no follow-up action remains.
//! A connect therefore flows into a table refresh and a first load.

use crate::app::{Action, App, AppEvent};
use crate::db::session::Connector;
use crate::edit_gate::GridEvent;
use crate::workbench::{EditOutcome, Workbench};

/// Execute `action` and every action it leads to
pub async fn perform<C: Connector>(
    action: Action,
    app: &mut App,
    workbench: &mut Workbench<C>,
) {
    let mut next = action;
    loop {
        let event = match next {
            Action::None => return,
            Action::Quit => {
                app.running = false;
                return;
            }
            Action::Connect(params) => match workbench.connect(&params).await {
                Ok(()) => AppEvent::Connected(params.display_name()),
                Err(e) => {
                    tracing::warn!(connection = %params.display_name(), error = %e, "connect failed");
                    AppEvent::ConnectFailed(e)
                }
            },
            Action::RefreshTables => match workbench.refresh_tables().await {
                Ok(tables) => AppEvent::TablesListed(tables),
                Err(e) => AppEvent::QueryFailed(e.to_string()),
            },
            Action::LoadTable(request) => match workbench.load_table(&request).await {
                Ok(Some(loaded)) => AppEvent::TableLoaded(loaded),
                Ok(None) => AppEvent::LoadSkipped,
                Err(e) => AppEvent::QueryFailed(e.to_string()),
            },
            Action::Grid(event) => {
                let change = match &event {
                    GridEvent::CellChanged(change) => Some(change.clone()),
                    GridEvent::CellDoubleClicked { .. } => None,
                };
                match (workbench.handle_grid_event(event).await, change) {
                    (Ok(EditOutcome::Armed), _) => AppEvent::EditArmed,
                    (Ok(EditOutcome::Saved { rows_affected }), Some(change)) => {
                        AppEvent::CellSaved {
                            change,
                            rows_affected,
                        }
                    }
                    (Ok(EditOutcome::Rejected), Some(change)) => AppEvent::CellRejected(change),
                    (Err(e), Some(change)) => AppEvent::CellSaveFailed {
                        change,
                        error: e.to_string(),
                    },
                    (Err(e), None) => AppEvent::QueryFailed(e.to_string()),
                    (Ok(_), None) => return,
                }
            }
        };
        next = app.handle_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::StatusLevel;
    use crate::config::ConnectionParameters;
    use crate::config::settings::Settings;
    use crate::db::mock::{MockConnector, MockDb};
    use crate::db::types::CellValue;
    use crate::edit_gate::CellChange;
    use crate::loader::LoadRequest;

    fn params() -> ConnectionParameters {
        ConnectionParameters::new("shop", "alice", "", "localhost")
    }

    fn db() -> MockDb {
        MockDb::new().with_table(
            "users",
            &["id", "name"],
            vec![
                vec![CellValue::Integer(2), CellValue::Text("b".to_string())],
                vec![CellValue::Integer(1), CellValue::Text("a".to_string())],
            ],
        )
    }

    #[tokio::test]
    async fn test_connect_lists_and_loads() {
        let db = db();
        let mut workbench = Workbench::new(MockConnector::new(db.clone()));
        let mut app = App::new(&Settings::default(), params());

        perform(Action::Connect(params()), &mut app, &mut workbench).await;

        assert_eq!(app.connection_name.as_deref(), Some("alice@localhost/shop"));
        assert_eq!(app.table_picker.tables(), ["users".to_string()]);
        assert_eq!(app.grid.table_name(), "users");
        assert_eq!(app.grid.cell_text(0, 0).as_deref(), Some("1"));
        assert!(db.log().iter().any(|s| s.starts_with("SELECT * FROM \"users\"")));
    }

    #[tokio::test]
    async fn test_refused_connection_shows_error() {
        let db = db();
        db.refuse_connections();
        let mut workbench = Workbench::new(MockConnector::new(db.clone()));
        let mut app = App::new(&Settings::default(), params());

        perform(Action::Connect(params()), &mut app, &mut workbench).await;

        assert!(app.connection_name.is_none());
        assert!(app.message.as_ref().unwrap().is_error);
    }

    #[tokio::test]
    async fn test_change_without_gesture_is_not_written() {
        let db = db();
        let mut workbench = Workbench::new(MockConnector::new(db.clone()));
        let mut app = App::new(&Settings::default(), params());
        perform(Action::Connect(params()), &mut app, &mut workbench).await;
        db.clear_log();

        let change = CellChange {
            row: 0,
            column: 1,
            value: "zz".to_string(),
            row_id: "1".to_string(),
        };
        perform(
            Action::Grid(GridEvent::CellChanged(change.clone())),
            &mut app,
            &mut workbench,
        )
        .await;
        assert!(db.log().is_empty());
        assert_eq!(app.grid.cell_text(0, 1).as_deref(), Some("a"));

        perform(
            Action::Grid(GridEvent::CellDoubleClicked { row: 0, column: 1 }),
            &mut app,
            &mut workbench,
        )
        .await;
        perform(
            Action::Grid(GridEvent::CellChanged(change)),
            &mut app,
            &mut workbench,
        )
        .await;
        assert_eq!(
            db.log(),
            vec![
                "UPDATE \"users\" SET \"name\" = 'zz' WHERE \"id\" = '1'".to_string(),
                "COMMIT".to_string(),
            ]
        );
        assert_eq!(app.grid.cell_text(0, 1).as_deref(), Some("zz"));
    }

    #[tokio::test]
    async fn test_quit_stops_app() {
        let mut workbench = Workbench::new(MockConnector::new(MockDb::new()));
        let mut app = App::new(&Settings::default(), params());
        perform(Action::Quit, &mut app, &mut workbench).await;
        assert!(!app.running);
    }

    #[tokio::test]
    async fn test_load_without_session_is_skipped() {
        let mut workbench = Workbench::new(MockConnector::new(MockDb::new()));
        let mut app = App::new(&Settings::default(), params());
        perform(
            Action::LoadTable(LoadRequest::default()),
            &mut app,
            &mut workbench,
        )
        .await;
        assert_eq!(
            app.status_message.as_ref().unwrap().level,
            StatusLevel::Warning
        );
    }
}
