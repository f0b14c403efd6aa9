//! Common test utilities and helpers
//!
//! Fixtures shared by the end-to-end tests, built on the recording
//! in-memory database from `pgcell::db::mock`.

#![allow(dead_code)]

use pgcell::config::ConnectionParameters;
use pgcell::db::mock::MockDb;
use pgcell::db::types::CellValue;

/// `users(id, name, email)` with three rows stored out of order, plus an
/// empty `orders(id, total)`
pub fn shop_db() -> MockDb {
    let text = |s: &str| CellValue::Text(s.to_string());
    MockDb::new()
        .with_table(
            "users",
            &["id", "name", "email"],
            vec![
                vec![CellValue::Integer(3), text("carol"), text("carol@example.com")],
                vec![CellValue::Integer(1), text("alice"), text("alice@example.com")],
                vec![CellValue::Integer(2), text("bob"), CellValue::Null],
            ],
        )
        .with_table("orders", &["id", "total"], vec![])
}

pub fn shop_params() -> ConnectionParameters {
    ConnectionParameters::new("shop", "alice", "secret", "localhost")
}
