//! pgcell - browse, filter and edit PostgreSQL table rows in the terminal
//!
//! pgcell connects to one database, lists the tables the connecting user owns,
//! shows a table's rows (optionally narrowed by a `LIKE` pattern on one column)
//! in a grid, and writes single-cell edits back with an `UPDATE` keyed by `id`.
//!
//! # Features
//!
//! - **Table Picker**: Tables owned by the connected user, outside system schemas
//! - **Filter**: `LIKE` pattern applied to the focused grid column
//! - **Grid**: Sorted rows with cell-level navigation and an inline editor
//! - **Edit Gate**: A cell change is only written after an explicit edit gesture
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`]: Connection parameters and application settings
//! - [`db`]: Sessions, statements and schema introspection
//! - [`loader`]: Fetching one table's columns and sorted rows
//! - [`edit_gate`]: The arm/commit state machine guarding writes
//! - [`workbench`]: Connection, loaded table and gate held together
//! - [`app`]: Application state and event handling
//! - [`dispatch`]: Running the actions the app asks for
//! - [`ui`]: Terminal user interface components
//! - [`logging`]: File logging setup
//! - [`error`]: Error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use pgcell::config::ConnectionParameters;
//! use pgcell::db::postgres::PostgresConnector;
//! use pgcell::loader::LoadRequest;
//! use pgcell::workbench::Workbench;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut workbench = Workbench::new(PostgresConnector);
//! workbench
//!     .connect(&ConnectionParameters::new("shop", "alice", "secret", "localhost"))
//!     .await?;
//!
//! for table in workbench.refresh_tables().await? {
//!     println!("{}", table);
//! }
//!
//! let request = LoadRequest {
//!     table: "users".to_string(),
//!     filter: "a%".to_string(),
//!     focused_column: Some(1),
//! };
//! if let Some(loaded) = workbench.load_table(&request).await? {
//!     println!("{} rows", loaded.rows.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod edit_gate;
pub mod error;
pub mod loader;
pub mod logging;
pub mod ui;
pub mod workbench;

pub use error::{ConfigError, DbError, PgcellError, Result};
