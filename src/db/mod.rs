//! Database layer
//!
//! A trait-based session abstraction with a PostgreSQL backend, statement
//! construction, schema introspection, and the typed values rows are made of.

pub mod connection;
pub mod mock;
pub mod postgres;
pub mod query;
pub mod schema;
pub mod session;
pub mod types;

// Re-export main types
pub use connection::ConnectionManager;
pub use query::Statement;
pub use schema::TableDescriptor;
pub use session::{Connector, Session};
pub use types::{CellValue, DataType, Row};
