//! Database schema introspection
//!
//! Just enough metadata to drive the grid: which tables the connecting user
//! owns, and the column names of one table in declaration order.

use crate::db::query::{build_column_list, build_table_list};
use crate::db::session::Session;
use crate::db::types::{CellValue, Row};
use crate::error::DbResult;

/// A table and its columns, as fetched for one load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Table name
    pub name: String,
    /// Column names; index `i` is grid column `i`
    pub columns: Vec<String>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

/// Names of the tables owned by `owner`, outside the system schemas
pub async fn list_owned_tables<S: Session>(session: &mut S, owner: &str) -> DbResult<Vec<String>> {
    let rows = session.query(&build_table_list(owner)).await?;
    Ok(first_column_text(rows))
}

/// Column names of `table` in declaration order; empty if it does not exist
pub async fn list_columns<S: Session>(session: &mut S, table: &str) -> DbResult<Vec<String>> {
    let rows = session.query(&build_column_list(table)).await?;
    Ok(first_column_text(rows))
}

fn first_column_text(rows: Vec<Row>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| match row.values.into_iter().next() {
            Some(CellValue::Text(s)) => Some(s),
            Some(CellValue::Null) | None => None,
            Some(other) => Some(other.display_text()),
        })
        .collect()
}
