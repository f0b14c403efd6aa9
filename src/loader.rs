//! Table loading
//!
//! Fetches a table's columns and rows (optionally filtered), sorts the rows and
//! ends the read transaction. Nothing here touches the UI: the caller either
//! gets a complete [`LoadedTable`] or an error and keeps what it had.

use crate::db::query::{build_select, resolve_filter_column};
use crate::db::schema::{TableDescriptor, list_columns};
use crate::db::session::Session;
use crate::db::types::{Row, sort_rows};
use crate::error::DbResult;

/// What to load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadRequest {
    /// Table name (empty when nothing is selected)
    pub table: String,
    /// LIKE pattern; empty means no filter
    pub filter: String,
    /// Grid column focused when the load was requested
    pub focused_column: Option<usize>,
}

/// A fully fetched table, ready to render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedTable {
    pub table: TableDescriptor,
    /// Rows sorted ascending by full-row comparison
    pub rows: Vec<Row>,
    /// Column the filter was applied to, if a filter was applied
    pub filter_column: Option<String>,
}

/// Load `request.table` through `session`.
///
/// Commits after a successful read; rolls back (best-effort) on failure so the
/// session stays usable.
pub async fn load_table<S: Session>(session: &mut S, request: &LoadRequest) -> DbResult<LoadedTable> {
    match fetch(session, request).await {
        Ok(loaded) => {
            session.commit().await?;
            tracing::info!(
                table = %loaded.table.name,
                columns = loaded.table.columns.len(),
                rows = loaded.rows.len(),
                filter_column = loaded.filter_column.as_deref().unwrap_or("-"),
                "table loaded"
            );
            Ok(loaded)
        }
        Err(e) => {
            if let Err(rollback_err) = session.rollback().await {
                tracing::debug!(error = %rollback_err, "rollback after failed load");
            }
            tracing::warn!(table = %request.table, error = %e, "table load failed");
            Err(e)
        }
    }
}

async fn fetch<S: Session>(session: &mut S, request: &LoadRequest) -> DbResult<LoadedTable> {
    let columns = list_columns(session, &request.table).await?;

    let filter_column = if request.filter.is_empty() {
        None
    } else {
        resolve_filter_column(&columns, request.focused_column).map(str::to_string)
    };
    let statement = build_select(&request.table, filter_column.as_deref(), &request.filter);

    let mut rows = session.query(&statement).await?;
    sort_rows(&mut rows);

    Ok(LoadedTable {
        table: TableDescriptor::new(request.table.clone(), columns),
        rows,
        filter_column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::{MockDb, MockSession};
    use crate::db::types::CellValue;

    fn users_db() -> MockDb {
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
    async fn test_load_sorts_rows_and_commits() {
        let db = users_db();
        let mut session = MockSession::new(db.clone());
        let request = LoadRequest {
            table: "users".to_string(),
            ..Default::default()
        };

        let loaded = load_table(&mut session, &request).await.unwrap();
        assert_eq!(loaded.table.columns, vec!["id", "name"]);
        assert_eq!(loaded.rows[0].values[0], CellValue::Integer(1));
        assert_eq!(loaded.rows[1].values[0], CellValue::Integer(2));
        assert!(loaded.filter_column.is_none());

        let log = db.log();
        assert_eq!(log.last().map(String::as_str), Some("COMMIT"));
        assert!(log.iter().any(|s| s == "SELECT * FROM \"users\""));
    }

    #[tokio::test]
    async fn test_filter_uses_focused_column() {
        let db = users_db();
        let mut session = MockSession::new(db.clone());
        let request = LoadRequest {
            table: "users".to_string(),
            filter: "a%".to_string(),
            focused_column: Some(1),
        };

        let loaded = load_table(&mut session, &request).await.unwrap();
        assert_eq!(loaded.filter_column.as_deref(), Some("name"));
        assert!(
            db.log()
                .contains(&"SELECT * FROM \"users\" WHERE \"name\"::text LIKE 'a%'".to_string())
        );
    }

    #[tokio::test]
    async fn test_filter_without_focus_uses_first_column() {
        let db = users_db();
        let mut session = MockSession::new(db.clone());
        let request = LoadRequest {
            table: "users".to_string(),
            filter: "1".to_string(),
            focused_column: None,
        };

        let loaded = load_table(&mut session, &request).await.unwrap();
        assert_eq!(loaded.filter_column.as_deref(), Some("id"));
    }

    #[tokio::test]
    async fn test_unknown_table_has_no_columns() {
        let db = users_db();
        let mut session = MockSession::new(db.clone());
        let request = LoadRequest {
            table: "ghost".to_string(),
            filter: "x".to_string(),
            focused_column: Some(0),
        };

        // The mock, like PostgreSQL, fails the SELECT for a missing relation
        let err = load_table(&mut session, &request).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert_eq!(db.log().last().map(String::as_str), Some("ROLLBACK"));
    }

    #[tokio::test]
    async fn test_failed_select_rolls_back() {
        let db = users_db().failing_on("SELECT * FROM");
        let mut session = MockSession::new(db.clone());
        let request = LoadRequest {
            table: "users".to_string(),
            ..Default::default()
        };

        assert!(load_table(&mut session, &request).await.is_err());
        let log = db.log();
        assert_eq!(log.last().map(String::as_str), Some("ROLLBACK"));
        assert!(!log.iter().any(|s| s == "COMMIT"));
    }
}
