//! Statement construction
//!
//! Every table/column name goes through [`quote_ident`] and every user
//! supplied value through [`quote_literal`] or a bound `$n` parameter.
//! Nothing user-controlled is ever spliced into SQL text unquoted.

use std::fmt;

/// A SQL statement plus its bound text parameters (`$1`, `$2`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Quote an identifier: `my"col` becomes `"my""col"`
pub fn quote_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push('"');
    for c in ident.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Quote a literal: `it's` becomes `'it''s'`.
///
/// Values containing a backslash use the `E'...'` form with doubled
/// backslashes so the result is the same whatever
/// `standard_conforming_strings` is set to.
pub fn quote_literal(value: &str) -> String {
    let has_backslash = value.contains('\\');
    let mut out = String::with_capacity(value.len() + 3);
    if has_backslash {
        out.push_str("E'");
    } else {
        out.push('\'');
    }
    for c in value.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Pick the filter column from the grid's focused column index.
///
/// Falls back to column 0 when nothing is focused or the index does not exist
/// in `columns`. Returns `None` only for a table without columns.
pub fn resolve_filter_column(columns: &[String], focused: Option<usize>) -> Option<&str> {
    focused
        .and_then(|idx| columns.get(idx))
        .or_else(|| columns.first())
        .map(String::as_str)
}

/// `SELECT * FROM "table"`, optionally `WHERE "column"::text LIKE 'pattern'`.
///
/// The filter only applies when `pattern` is non-empty and a filter column
/// is given.
pub fn build_select(table: &str, filter_column: Option<&str>, pattern: &str) -> Statement {
    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    if let Some(column) = filter_column
        && !pattern.is_empty()
    {
        sql.push_str(&format!(
            " WHERE {}::text LIKE {}",
            quote_ident(column),
            quote_literal(pattern)
        ));
    }
    Statement::new(sql)
}

/// `UPDATE "table" SET "column" = 'value' WHERE "id" = 'id'`.
///
/// Both values are sent as untyped literals so the server coerces them to
/// the column types.
pub fn build_update(table: &str, column: &str, new_value: &str, id_value: &str) -> Statement {
    Statement::new(format!(
        "UPDATE {} SET {} = {} WHERE {} = {}",
        quote_ident(table),
        quote_ident(column),
        quote_literal(new_value),
        quote_ident("id"),
        quote_literal(id_value)
    ))
}

/// Tables owned by `owner`, outside the system schemas
pub fn build_table_list(owner: &str) -> Statement {
    Statement::with_params(
        "SELECT tablename FROM pg_catalog.pg_tables \
         WHERE schemaname NOT IN ('pg_catalog', 'information_schema') \
         AND tableowner = $1 \
         ORDER BY tablename",
        vec![owner.to_string()],
    )
}

/// Column names of the relation an unqualified `SELECT * FROM "table"` reads,
/// in declaration order
pub fn build_column_list(table: &str) -> Statement {
    Statement::with_params(
        "SELECT a.attname::text FROM pg_catalog.pg_attribute a \
         WHERE a.attrelid = to_regclass(quote_ident($1)) \
         AND a.attnum > 0 AND NOT a.attisdropped \
         ORDER BY a.attnum",
        vec![table.to_string()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("my\"col"), "\"my\"\"col\"");
        assert_eq!(quote_ident("Mixed Case"), "\"Mixed Case\"");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("x%"), "'x%'");
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal(""), "''");
        assert_eq!(quote_literal("a\\b"), "E'a\\\\b'");
    }

    #[test]
    fn test_build_select_without_filter() {
        let stmt = build_select("t", Some("b"), "");
        assert_eq!(stmt.sql, "SELECT * FROM \"t\"");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_build_select_with_filter() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let column = resolve_filter_column(&columns, Some(1));
        let stmt = build_select("t", column, "x%");
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"t\" WHERE \"b\"::text LIKE 'x%'"
        );
    }

    #[test]
    fn test_build_select_escapes_injection_attempts() {
        let stmt = build_select("t\"; DROP TABLE t; --", Some("b"), "x' OR '1'='1");
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"t\"\"; DROP TABLE t; --\" WHERE \"b\"::text LIKE 'x'' OR ''1''=''1'"
        );
    }

    #[test]
    fn test_build_select_no_filter_column() {
        let stmt = build_select("empty", None, "x%");
        assert_eq!(stmt.sql, "SELECT * FROM \"empty\"");
    }

    #[test]
    fn test_build_update() {
        let stmt = build_update("t", "b", "newval", "42");
        assert_eq!(
            stmt.sql,
            "UPDATE \"t\" SET \"b\" = 'newval' WHERE \"id\" = '42'"
        );
    }

    #[test]
    fn test_build_update_escapes_value_and_id() {
        let stmt = build_update("t", "b", "O'Brien", "1' OR '1'='1");
        assert_eq!(
            stmt.sql,
            "UPDATE \"t\" SET \"b\" = 'O''Brien' WHERE \"id\" = '1'' OR ''1''=''1'"
        );
    }

    #[test]
    fn test_build_update_backslash_value() {
        let stmt = build_update("t", "path", "C:\\tmp", "7");
        assert_eq!(
            stmt.sql,
            "UPDATE \"t\" SET \"path\" = E'C:\\\\tmp' WHERE \"id\" = '7'"
        );
    }

    #[test]
    fn test_metadata_statements_bind_parameters() {
        let tables = build_table_list("alice'; --");
        assert_eq!(tables.params, vec!["alice'; --".to_string()]);
        assert!(!tables.sql.contains("alice"));
        assert!(tables.sql.contains("$1"));

        let cols = build_column_list("users");
        assert_eq!(cols.params, vec!["users".to_string()]);
        assert!(cols.sql.contains("ORDER BY a.attnum"));
    }

    #[test]
    fn test_resolve_filter_column_defaults_to_first() {
        let columns = vec!["id".to_string(), "name".to_string()];
        assert_eq!(resolve_filter_column(&columns, None), Some("id"));
        assert_eq!(resolve_filter_column(&columns, Some(1)), Some("name"));
        assert_eq!(resolve_filter_column(&columns, Some(7)), Some("id"));
        assert_eq!(resolve_filter_column(&[], Some(0)), None);
    }
}
