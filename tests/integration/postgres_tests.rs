//! Integration tests for the PostgreSQL session
//!
//! These tests require a running PostgreSQL server; see `tests/integration.rs`.

use pgcell::config::{ConnectionParameters, SslMode};
use pgcell::db::postgres::{PostgresConnector, PostgresSession};
use pgcell::db::query::Statement;
use pgcell::db::session::{Connector, Session};
use pgcell::db::types::CellValue;
use pgcell::edit_gate::{CellChange, GridEvent};
use pgcell::error::DbError;
use pgcell::loader::LoadRequest;
use pgcell::workbench::{EditOutcome, Workbench};

/// Get test database connection parameters
fn test_params() -> ConnectionParameters {
    let mut params = ConnectionParameters::new(
        std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "test_db".to_string()),
        std::env::var("TEST_DB_USER").unwrap_or_else(|_| "test_user".to_string()),
        std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "test_password".to_string()),
        std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
    );
    params.port = std::env::var("TEST_DB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5433);
    params.ssl_mode = SslMode::Disable;
    params
}

async fn open_or_skip() -> Option<PostgresSession> {
    let params = test_params();
    match PostgresConnector.open(&params).await {
        Ok(session) => Some(session),
        Err(e) => {
            eprintln!(
                "Skipping test: Database not available at {}:{} - {}",
                params.host, params.port, e
            );
            None
        }
    }
}

/// (Re)create `table(id int primary key, name text, score numeric)` with three rows
async fn seed(table: &str) -> Option<()> {
    let mut session = open_or_skip().await?;
    let script = [
        format!("DROP TABLE IF EXISTS {table}"),
        format!("CREATE TABLE {table} (id integer PRIMARY KEY, name text, score numeric)"),
        format!(
            "INSERT INTO {table} VALUES (2, 'bob', 7.5), (1, 'alice', NULL), (3, 'carol', 10)"
        ),
    ];
    for sql in script {
        session.execute(&Statement::new(sql)).await.unwrap();
    }
    session.commit().await.unwrap();
    session.close().await.unwrap();
    Some(())
}

#[tokio::test]
async fn test_connect_to_database() {
    let Some(session) = open_or_skip().await else {
        return;
    };
    assert!(!session.is_closed());
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_wrong_password_reports_cause() {
    if open_or_skip().await.is_none() {
        return;
    }
    let mut params = test_params();
    params.password = "definitely-not-the-password".to_string();
    match PostgresConnector.open(&params).await {
        Err(DbError::ConnectionFailed(report)) => assert!(!report.is_empty()),
        Err(other) => panic!("unexpected error: {other}"),
        // trust authentication accepts any password
        Ok(session) => session.close().await.unwrap(),
    }
}

#[tokio::test]
async fn test_lists_owned_tables() {
    if seed("pgcell_it_list").await.is_none() {
        return;
    }
    let mut workbench = Workbench::new(PostgresConnector);
    workbench.connect(&test_params()).await.unwrap();

    let tables = workbench.refresh_tables().await.unwrap();
    assert!(tables.contains(&"pgcell_it_list".to_string()));
    assert!(!tables.iter().any(|t| t.starts_with("pg_")));
    workbench.shutdown().await;
}

#[tokio::test]
async fn test_load_sorts_and_filters() {
    if seed("pgcell_it_load").await.is_none() {
        return;
    }
    let mut workbench = Workbench::new(PostgresConnector);
    workbench.connect(&test_params()).await.unwrap();

    let loaded = workbench
        .load_table(&LoadRequest {
            table: "pgcell_it_load".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.table.columns, ["id", "name", "score"]);
    let ids: Vec<String> = loaded.rows.iter().filter_map(|r| r.text_at(0)).collect();
    assert_eq!(ids, ["1", "2", "3"]);
    assert_eq!(loaded.rows[0].values[2], CellValue::Null);

    let filtered = workbench
        .load_table(&LoadRequest {
            table: "pgcell_it_load".to_string(),
            filter: "%o%".to_string(),
            focused_column: Some(1),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(filtered.filter_column.as_deref(), Some("name"));
    let names: Vec<String> = filtered.rows.iter().filter_map(|r| r.text_at(1)).collect();
    assert_eq!(names, ["bob", "carol"]);
    workbench.shutdown().await;
}

#[tokio::test]
async fn test_missing_table_keeps_session_usable() {
    if open_or_skip().await.is_none() {
        return;
    }
    let mut workbench = Workbench::new(PostgresConnector);
    workbench.connect(&test_params()).await.unwrap();

    let err = workbench
        .load_table(&LoadRequest {
            table: "pgcell_it_does_not_exist".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::QueryFailed(_)));

    assert!(workbench.refresh_tables().await.is_ok());
    workbench.shutdown().await;
}

#[tokio::test]
async fn test_gated_update_round_trip() {
    if seed("pgcell_it_edit").await.is_none() {
        return;
    }
    let mut workbench = Workbench::new(PostgresConnector);
    workbench.connect(&test_params()).await.unwrap();
    let request = LoadRequest {
        table: "pgcell_it_edit".to_string(),
        ..Default::default()
    };
    workbench.load_table(&request).await.unwrap();

    let change = CellChange {
        row: 1,
        column: 2,
        value: "8.25".to_string(),
        row_id: "2".to_string(),
    };

    let outcome = workbench
        .handle_grid_event(GridEvent::CellChanged(change.clone()))
        .await
        .unwrap();
    assert_eq!(outcome, EditOutcome::Rejected);

    workbench
        .handle_grid_event(GridEvent::CellDoubleClicked { row: 1, column: 2 })
        .await
        .unwrap();
    let outcome = workbench
        .handle_grid_event(GridEvent::CellChanged(change))
        .await
        .unwrap();
    assert_eq!(outcome, EditOutcome::Saved { rows_affected: 1 });

    let reloaded = workbench.load_table(&request).await.unwrap().unwrap();
    assert_eq!(reloaded.rows[1].text_at(2).as_deref(), Some("8.25"));
    workbench.shutdown().await;
}

#[tokio::test]
async fn test_values_show_server_text() {
    let Some(mut session) = open_or_skip().await else {
        return;
    };
    let script = [
        "DROP TABLE IF EXISTS pgcell_it_types",
        "DROP TYPE IF EXISTS pgcell_mood",
        "CREATE TYPE pgcell_mood AS ENUM ('sad', 'happy')",
        "CREATE TABLE pgcell_it_types \
         (id integer PRIMARY KEY, mood pgcell_mood, wide numeric, span interval, ratio real)",
        "INSERT INTO pgcell_it_types VALUES \
         (1, 'happy', 123456789012345678901234567890.5, '1 day', 0.1)",
    ];
    for sql in script {
        session.execute(&Statement::new(sql)).await.unwrap();
    }
    session.commit().await.unwrap();

    let rows = session
        .query(&Statement::new("SELECT * FROM pgcell_it_types"))
        .await
        .unwrap();
    let texts: Vec<String> = (0..5).filter_map(|i| rows[0].text_at(i)).collect();
    assert_eq!(
        texts,
        ["1", "happy", "123456789012345678901234567890.5", "1 day", "0.1"]
    );
    session.rollback().await.unwrap();
    session.close().await.unwrap();
}
