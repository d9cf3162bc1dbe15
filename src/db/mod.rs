//! Database abstraction layer for pgcol.
//!
//! Provides a trait-based interface for database operations, so the driver
//! can run against PostgreSQL or an in-memory mock interchangeably.

mod mock;
mod postgres;
mod types;

pub use mock::{MockConnector, MockDatabaseClient, MockStats};
pub use postgres::{PostgresClient, PostgresConnector};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::{PgcolError, Result};
use async_trait::async_trait;

/// Reported for statements that describe no result columns.
pub(crate) const NO_TUPLES_MESSAGE: &str =
    "statement returned no tuples; only row-returning statements are supported";

/// Opens database connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens one connection from structured settings.
    async fn connect_with(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>>;

    /// Opens one connection from a key/value or URL connection string.
    ///
    /// A string that does not parse is reported as a connection error.
    async fn connect(&self, conninfo: &str) -> Result<Box<dyn DatabaseClient>> {
        let config = parse_connection_string(conninfo)?;
        self.connect_with(&config).await
    }
}

/// Parses a connection string, reporting a malformed one as a connection error.
pub fn parse_connection_string(conninfo: &str) -> Result<ConnectionConfig> {
    ConnectionConfig::parse(conninfo).map_err(|e| match e {
        PgcolError::Config(msg) => {
            PgcolError::connection(format!("invalid connection string: {msg}"))
        }
        other => other,
    })
}

/// An open database session.
///
/// Each handle has a single owner. After `close` the handle rejects further
/// queries; closing again is a no-op.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a statement that returns rows.
    ///
    /// Statements that describe no result columns (DDL, DML) are rejected
    /// with a query error.
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<()>;

    /// Returns true once the connection has been closed.
    fn is_closed(&self) -> bool;
}
