//! Connection parameters
//!
//! What the connection form produces: database, user, password, host (plus
//! port and TLS mode). Constructed once per connect attempt and discarded.

use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};

/// Parameters for one connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    /// Database name
    pub database: String,

    /// Username (also the owner whose tables are listed)
    pub user: String,

    /// Password (may be empty)
    pub password: String,

    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// SSL mode
    pub ssl_mode: SslMode,
}

/// SSL connection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

impl std::str::FromStr for SslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(format!(
                "unknown sslmode '{}' (expected disable, prefer or require)",
                other
            )),
        }
    }
}

pub const DEFAULT_PORT: u16 = 5432;

impl ConnectionParameters {
    pub fn new(
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            ssl_mode: SslMode::default(),
        }
    }

    /// Check that database, user and host are filled in.
    ///
    /// The password is allowed to be empty (trust/peer authentication).
    pub fn validate(&self) -> DbResult<()> {
        if self.database.trim().is_empty() {
            return Err(DbError::MissingField("database"));
        }
        if self.user.trim().is_empty() {
            return Err(DbError::MissingField("user"));
        }
        if self.host.trim().is_empty() {
            return Err(DbError::MissingField("host"));
        }
        Ok(())
    }

    /// Short human label, e.g. `alice@localhost/shop`
    pub fn display_name(&self) -> String {
        format!("{}@{}/{}", self.user, self.host, self.database)
    }

    /// Build a PostgreSQL connection string (without password)
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} sslmode={}",
            quote_conn_value(&self.host),
            self.port,
            quote_conn_value(&self.database),
            quote_conn_value(&self.user),
            self.ssl_mode.as_str()
        )
    }

    /// Build a full connection string including password
    pub fn connection_string_with_password(&self) -> String {
        let base = self.connection_string();
        if self.password.is_empty() {
            base
        } else {
            format!("{} password={}", base, quote_conn_value(&self.password))
        }
    }
}

/// Quote a libpq keyword/value when it contains spaces, quotes or backslashes.
fn quote_conn_value(value: &str) -> String {
    if !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\')
    {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}
