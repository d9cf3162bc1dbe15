//! Integration tests for pgcol.

pub mod connection_test;
pub mod driver_test;
pub mod query_test;
