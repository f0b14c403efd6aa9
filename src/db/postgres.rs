//! PostgreSQL session
//!
//! Concrete implementation using tokio-postgres.

use std::collections::HashSet;
use std::error::Error;

use crate::config::{ConnectionParameters, SslMode};
use crate::db::query::{Statement, quote_ident};
use crate::db::session::{Connector, Session};
use crate::db::types::{CellValue, DataType, Row};
use crate::error::{DbError, DbResult, error_report};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tokio_postgres::Client;
use tokio_postgres::types::{FromSql, ToSql, Type};

/// Opens [`PostgresSession`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector;

/// PostgreSQL session with driver-style implicit transactions
pub struct PostgresSession {
    /// The tokio-postgres client
    client: Client,
    /// Background task driving the connection
    connection: JoinHandle<()>,
    /// Whether a BEGIN has been issued and not yet ended
    in_transaction: bool,
}

impl Connector for PostgresConnector {
    type Session = PostgresSession;

    async fn open(&self, params: &ConnectionParameters) -> DbResult<PostgresSession> {
        let conn_string = params.connection_string_with_password();
        let connect_err = |e: tokio_postgres::Error| DbError::ConnectionFailed(error_report(&e));

        let (client, connection) = match params.ssl_mode {
            SslMode::Disable => {
                let (client, connection) =
                    tokio_postgres::connect(&conn_string, tokio_postgres::NoTls)
                        .await
                        .map_err(connect_err)?;
                let handle = tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::warn!(error = %e, "connection lost");
                    }
                });
                (client, handle)
            }
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                let (client, connection) = tokio_postgres::connect(&conn_string, tls)
                    .await
                    .map_err(connect_err)?;
                let handle = tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::warn!(error = %e, "connection lost");
                    }
                });
                (client, handle)
            }
        };

        Ok(PostgresSession {
            client,
            connection,
            in_transaction: false,
        })
    }
}

impl PostgresSession {
    async fn ensure_transaction(&mut self) -> DbResult<()> {
        if !self.in_transaction {
            self.client.batch_execute("BEGIN").await.map_err(query_err)?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl Session for PostgresSession {
    async fn query(&mut self, statement: &Statement) -> DbResult<Vec<Row>> {
        self.ensure_transaction().await?;
        tracing::debug!(sql = %statement.sql, "query");

        let params = bind_params(statement);
        let mut prepared = self
            .client
            .prepare(statement.sql.as_str())
            .await
            .map_err(query_err)?;
        let columns: Vec<(&str, &Type)> = prepared
            .columns()
            .iter()
            .map(|c| (c.name(), c.type_()))
            .collect();
        if let Some(sql) = text_cast_select(&statement.sql, &columns) {
            tracing::debug!(sql = %sql, "query re-prepared with text casts");
            prepared = self.client.prepare(&sql).await.map_err(query_err)?;
        }
        let pg_rows = self
            .client
            .query(&prepared, &params)
            .await
            .map_err(query_err)?;

        let mut rows = Vec::with_capacity(pg_rows.len());
        for pg_row in &pg_rows {
            let mut values = Vec::with_capacity(pg_row.len());
            for (i, col) in pg_row.columns().iter().enumerate() {
                let data_type = pg_type_to_datatype(col.type_());
                values.push(extract_cell_value(pg_row, i, &data_type));
            }
            rows.push(Row { values });
        }
        Ok(rows)
    }

    async fn execute(&mut self, statement: &Statement) -> DbResult<u64> {
        self.ensure_transaction().await?;
        tracing::debug!(sql = %statement.sql, "execute");

        let params = bind_params(statement);
        self.client
            .execute(statement.sql.as_str(), &params)
            .await
            .map_err(query_err)
    }

    async fn commit(&mut self) -> DbResult<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.client.batch_execute("COMMIT").await.map_err(query_err)?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.client
                .batch_execute("ROLLBACK")
                .await
                .map_err(query_err)?;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    async fn close(self) -> DbResult<()> {
        // Dropping the client sends Terminate; the connection task then ends.
        drop(self.client);
        self.connection
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))
    }
}

fn query_err(e: tokio_postgres::Error) -> DbError {
    DbError::QueryFailed(match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => error_report(&e),
    })
}

fn bind_params(statement: &Statement) -> Vec<&(dyn ToSql + Sync)> {
    statement
        .params
        .iter()
        .map(|p| p as &(dyn ToSql + Sync))
        .collect()
}

/// Map tokio_postgres Type to our DataType enum
fn pg_type_to_datatype(pg_type: &Type) -> DataType {
    match *pg_type {
        Type::INT2 => DataType::SmallInt,
        Type::INT4 => DataType::Integer,
        Type::INT8 => DataType::BigInt,
        Type::FLOAT4 => DataType::Real,
        Type::FLOAT8 => DataType::Double,
        Type::NUMERIC => DataType::Numeric,
        Type::TEXT | Type::NAME => DataType::Text,
        Type::VARCHAR => DataType::Varchar,
        Type::BPCHAR => DataType::Char,
        Type::BOOL => DataType::Boolean,
        Type::DATE => DataType::Date,
        Type::TIME => DataType::Time,
        Type::TIMESTAMP => DataType::Timestamp,
        Type::TIMESTAMPTZ => DataType::TimestampTz,
        Type::INTERVAL => DataType::Interval,
        Type::JSON => DataType::Json,
        Type::JSONB => DataType::Jsonb,
        Type::BYTEA => DataType::Bytea,
        Type::UUID => DataType::Uuid,
        Type::BOOL_ARRAY => DataType::Array(Box::new(DataType::Boolean)),
        Type::INT2_ARRAY => DataType::Array(Box::new(DataType::SmallInt)),
        Type::INT4_ARRAY => DataType::Array(Box::new(DataType::Integer)),
        Type::INT8_ARRAY => DataType::Array(Box::new(DataType::BigInt)),
        Type::FLOAT8_ARRAY => DataType::Array(Box::new(DataType::Double)),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::NAME_ARRAY => {
            DataType::Array(Box::new(DataType::Text))
        }
        _ => DataType::Unknown(pg_type.name().to_string()),
    }
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

/// Extract a cell value from a tokio_postgres Row based on the column's DataType.
///
/// Tries the expected Rust type first and falls back to the text form, so a
/// type we have no mapping for still shows up in the grid.
fn extract_cell_value(row: &tokio_postgres::Row, idx: usize, data_type: &DataType) -> CellValue {
    match data_type {
        DataType::SmallInt => typed(row, idx, |v: i16| CellValue::Integer(v as i64)),
        DataType::Integer => typed(row, idx, |v: i32| CellValue::Integer(v as i64)),
        DataType::BigInt => typed(row, idx, CellValue::Integer),
        DataType::Real => typed(row, idx, |v: f32| CellValue::Float(widen_real(v))),
        DataType::Double => typed(row, idx, CellValue::Float),
        DataType::Numeric => typed(row, idx, |v: NumericText| numeric_cell(v.0)),
        DataType::Boolean => typed(row, idx, CellValue::Boolean),
        DataType::Json | DataType::Jsonb => typed(row, idx, CellValue::Json),
        DataType::Bytea => typed(row, idx, CellValue::Binary),
        DataType::Uuid => typed(row, idx, |v: uuid::Uuid| CellValue::Uuid(v.to_string())),
        DataType::Timestamp => {
            typed(row, idx, |v: chrono::NaiveDateTime| CellValue::DateTime(v.to_string()))
        }
        DataType::TimestampTz => typed(row, idx, |v: chrono::DateTime<chrono::Utc>| {
            CellValue::DateTime(v.to_string())
        }),
        DataType::Date => typed(row, idx, |v: chrono::NaiveDate| CellValue::DateTime(v.to_string())),
        DataType::Time => typed(row, idx, |v: chrono::NaiveTime| CellValue::DateTime(v.to_string())),
        DataType::Array(inner) => extract_array_value(row, idx, inner),
        // Text types and fallback for unknown types
        _ => try_as_string(row, idx),
    }
}

/// Read column `idx` as `Option<T>`, mapping NULL to `CellValue::Null` and a
/// type mismatch to the string fallback.
fn typed<'a, T, F>(row: &'a tokio_postgres::Row, idx: usize, wrap: F) -> CellValue
where
    T: FromSql<'a>,
    F: FnOnce(T) -> CellValue,
{
    match row.try_get::<_, Option<T>>(idx) {
        Ok(Some(v)) => wrap(v),
        Ok(None) => CellValue::Null,
        Err(_) => try_as_string(row, idx),
    }
}

fn extract_array_value(row: &tokio_postgres::Row, idx: usize, inner: &DataType) -> CellValue {
    match inner {
        DataType::Text => typed(row, idx, |v: Vec<String>| {
            CellValue::Array(v.into_iter().map(CellValue::Text).collect())
        }),
        DataType::SmallInt => typed(row, idx, |v: Vec<i16>| {
            CellValue::Array(v.into_iter().map(|n| CellValue::Integer(n as i64)).collect())
        }),
        DataType::Integer => typed(row, idx, |v: Vec<i32>| {
            CellValue::Array(v.into_iter().map(|n| CellValue::Integer(n as i64)).collect())
        }),
        DataType::BigInt => typed(row, idx, |v: Vec<i64>| {
            CellValue::Array(v.into_iter().map(CellValue::Integer).collect())
        }),
        DataType::Double => typed(row, idx, |v: Vec<f64>| {
            CellValue::Array(v.into_iter().map(CellValue::Float).collect())
        }),
        DataType::Boolean => typed(row, idx, |v: Vec<bool>| {
            CellValue::Array(v.into_iter().map(CellValue::Boolean).collect())
        }),
        _ => try_as_string(row, idx),
    }
}

/// Try to extract a value as a string (fallback for type mismatches).
///
/// When even the string fallback fails, includes the postgres type name
/// in the message so the user knows what type couldn't be displayed.
fn try_as_string(row: &tokio_postgres::Row, idx: usize) -> CellValue {
    match row.try_get::<_, Option<String>>(idx) {
        Ok(Some(v)) => CellValue::Text(v),
        Ok(None) => CellValue::Null,
        Err(_) => {
            let type_name = row
                .columns()
                .get(idx)
                .map_or("unknown", |c| c.type_().name());
            CellValue::Text(format!("<unable to display: {}>", type_name))
        }
    }
}

/// Whether [`extract_cell_value`] can decode this type's binary form
fn has_native_decoder(data_type: &DataType) -> bool {
    !matches!(data_type, DataType::Interval | DataType::Unknown(_))
}

/// Wrap a row-returning statement so columns without a native decoder come
/// back as the server's own text output (enums, interval, inet, money, ...).
///
/// Returns `None` when every column decodes natively, or when duplicate
/// column names make the columns impossible to reference by name.
fn text_cast_select(sql: &str, columns: &[(&str, &Type)]) -> Option<String> {
    let needs_cast = |ty: &Type| !has_native_decoder(&pg_type_to_datatype(ty));
    if !columns.iter().any(|(_, ty)| needs_cast(ty)) {
        return None;
    }
    let mut seen = HashSet::new();
    if !columns.iter().all(|(name, _)| seen.insert(*name)) {
        return None;
    }

    let select_list: Vec<String> = columns
        .iter()
        .map(|(name, ty)| {
            let ident = quote_ident(name);
            if needs_cast(ty) {
                format!("{ident}::text AS {ident}")
            } else {
                ident
            }
        })
        .collect();
    Some(format!(
        "SELECT {} FROM ({}) AS pgcell_rows",
        select_list.join(", "),
        sql
    ))
}

/// `real` values keep their shortest `f32` text when widened
fn widen_real(v: f32) -> f64 {
    v.to_string().parse().unwrap_or(v as f64)
}

/// NUMERIC as its exact text, decoded from the binary wire form
struct NumericText(String);

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        numeric_to_string(raw).map(NumericText)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// A `Decimal` when it holds the value exactly, the text otherwise
/// (NaN, Infinity, more digits than `Decimal` carries)
fn numeric_cell(text: String) -> CellValue {
    match text.parse::<Decimal>() {
        Ok(d) if d.to_string() == text => CellValue::Decimal(d),
        _ => CellValue::Text(text),
    }
}

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Render the binary NUMERIC form: ndigits, weight, sign, dscale, then
/// `ndigits` base-10000 digits, most significant first.
fn numeric_to_string(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    let word = |i: usize| {
        raw.get(i..i + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or("numeric value is truncated")
    };
    let ndigits = word(0)? as usize;
    let weight = word(2)? as i16 as i64;
    let sign = word(4)?;
    let dscale = word(6)? as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign {other:#06x}").into()),
    }
    let digits = (0..ndigits)
        .map(|i| word(8 + 2 * i))
        .collect::<Result<Vec<u16>, _>>()?;
    let digit = |i: i64| {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit(0).to_string());
        for i in 1..=weight {
            out.push_str(&format!("{:04}", digit(i)));
        }
    }
    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", digit(i)));
            i += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Binary NUMERIC: header words followed by base-10000 digits
    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(digits.len() as u16).to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    #[test]
    fn test_numeric_wider_than_decimal() {
        // 123456789012345678901234567890.5
        let raw = numeric(
            7,
            NUMERIC_POS,
            1,
            &[12, 3456, 7890, 1234, 5678, 9012, 3456, 7890, 5000],
        );
        let text = numeric_to_string(&raw).unwrap();
        assert_eq!(text, "123456789012345678901234567890.5");
        assert_eq!(numeric_cell(text.clone()), CellValue::Text(text));
    }

    #[test]
    fn test_numeric_small_values() {
        assert_eq!(numeric_to_string(&numeric(0, NUMERIC_POS, 0, &[])).unwrap(), "0");
        assert_eq!(
            numeric_to_string(&numeric(0, NUMERIC_NEG, 2, &[7, 5000])).unwrap(),
            "-7.50"
        );
        // 0.00012
        assert_eq!(
            numeric_to_string(&numeric(-1, NUMERIC_POS, 5, &[1, 2000])).unwrap(),
            "0.00012"
        );
        // 10000
        assert_eq!(
            numeric_to_string(&numeric(1, NUMERIC_POS, 0, &[1])).unwrap(),
            "10000"
        );
    }

    #[test]
    fn test_numeric_special_values() {
        assert_eq!(numeric_to_string(&numeric(0, NUMERIC_NAN, 0, &[])).unwrap(), "NaN");
        assert_eq!(
            numeric_to_string(&numeric(0, NUMERIC_NINF, 0, &[])).unwrap(),
            "-Infinity"
        );
        assert!(numeric_to_string(&[0, 1]).is_err());
    }

    #[test]
    fn test_numeric_in_range_stays_decimal() {
        assert!(matches!(
            numeric_cell("-7.50".to_string()),
            CellValue::Decimal(d) if d.to_string() == "-7.50"
        ));
    }

    #[test]
    fn test_real_keeps_shortest_text() {
        assert_eq!(CellValue::Float(widen_real(0.1)).display_text(), "0.1");
        assert_eq!(CellValue::Float(widen_real(-2.5)).display_text(), "-2.5");
    }

    #[test]
    fn test_text_cast_only_for_undecodable_columns() {
        let sql = "SELECT * FROM \"t\"";
        assert_eq!(
            text_cast_select(sql, &[("id", &Type::INT4), ("name", &Type::TEXT)]),
            None
        );
        assert_eq!(
            text_cast_select(
                sql,
                &[("id", &Type::INT4), ("span", &Type::INTERVAL), ("ip", &Type::INET)]
            )
            .as_deref(),
            Some(
                "SELECT \"id\", \"span\"::text AS \"span\", \"ip\"::text AS \"ip\" \
                 FROM (SELECT * FROM \"t\") AS pgcell_rows"
            )
        );
        assert_eq!(
            text_cast_select(sql, &[("a", &Type::CHAR)]).as_deref(),
            Some("SELECT \"a\"::text AS \"a\" FROM (SELECT * FROM \"t\") AS pgcell_rows")
        );
    }

    #[test]
    fn test_text_cast_skipped_for_duplicate_names() {
        let columns = [("x", &Type::INTERVAL), ("x", &Type::INT4)];
        assert_eq!(text_cast_select("SELECT 1", &columns), None);
    }
}
