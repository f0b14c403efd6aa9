//! Error types for pgcell
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors with clear error chains.

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::io;

/// Errors that end the terminal session.
///
/// Database and configuration failures are reported in the UI or before
/// the terminal starts, so they have their own types below.
#[derive(Debug, thiserror::Error)]
pub enum PgcellError {
    /// Terminal IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The terminal stopped delivering input
    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Database operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DbError {
    /// A required connection field was left empty; nothing was attempted
    #[error("Missing required connection field: {0}")]
    MissingField(&'static str),

    /// Failed to establish connection (carries the full diagnostic report)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Metadata fetch, SELECT or UPDATE failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Not connected to a database
    #[error("Not connected to database")]
    NotConnected,
}

impl DbError {
    /// Whether this error was raised before any database call was made
    pub fn is_validation(&self) -> bool {
        matches!(self, DbError::MissingField(_))
    }
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file could not be read
    #[error("Failed to read configuration: {0}")]
    Read(#[from] io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Specialized Result type for pgcell operations
pub type Result<T> = std::result::Result<T, PgcellError>;

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Render an error together with its whole `source()` chain.
///
/// Driver errors are often one-liners whose useful part ("Connection refused",
/// "password authentication failed") lives in a nested source, so this is what
/// the user sees when a connection attempt fails.
pub fn error_report(err: &(dyn StdError + 'static)) -> String {
    let mut report = err.to_string();
    let mut source = err.source();
    if source.is_some() {
        report.push_str("\n\nCaused by:");
    }
    let mut depth = 0;
    while let Some(cause) = source {
        let _ = write!(report, "\n    {}: {}", depth, cause);
        depth += 1;
        source = cause.source();
    }
    report
}
