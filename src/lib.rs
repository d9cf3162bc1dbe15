//! pgcol - connect to PostgreSQL, run one query, print the first column.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod conninfo;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod scratch;
