//! Integration test runner
//!
//! To run these tests:
//! 1. Start a PostgreSQL server the test user can create tables in
//! 2. Run tests: cargo test --test integration
//!
//! Environment variables (with defaults):
//! - TEST_DB_HOST: localhost
//! - TEST_DB_PORT: 5433
//! - TEST_DB_NAME: test_db
//! - TEST_DB_USER: test_user
//! - TEST_DB_PASSWORD: test_password
//!
//! Every test skips itself when the server is not reachable.

#[path = "integration/postgres_tests.rs"]
mod postgres_tests;
