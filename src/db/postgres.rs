//! PostgreSQL database client implementation.
//!
//! Provides `PostgresConnector` and `PostgresClient`, which implement the
//! `Connector` and `DatabaseClient` traits using a single sqlx connection.

use crate::config::{ConnectionConfig, DEFAULT_HOST, DEFAULT_PORT};
use crate::db::{
    ColumnInfo, Connector, DatabaseClient, QueryResult, Row, Value, NO_TUPLES_MESSAGE,
};
use crate::error::{PgcolError, Result};
use async_trait::async_trait;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, PgSslMode, PgStatement};
use sqlx::{Column as SqlxColumn, Connection, Executor, Row as SqlxRow, Statement, TypeInfo};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Opens single PostgreSQL connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConnector;

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect_with(&self, config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
        let client = PostgresClient::connect(config).await?;
        Ok(Box::new(client))
    }
}

/// PostgreSQL database client owning one connection.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Option<PgConnection>,
}

impl PostgresClient {
    /// Opens a connection described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = connect_options(config)?;
        debug!("Connecting to {}", config.display_string());

        let attempt = PgConnection::connect_with(&options);
        let result = match config.connect_timeout.filter(|secs| *secs > 0) {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), attempt)
                .await
                .map_err(|_| {
                    PgcolError::connection(format!(
                        "could not connect to {}: timed out after {secs} seconds",
                        config.redacted_conninfo()
                    ))
                })?,
            None => attempt.await,
        };

        let conn = result.map_err(|e| map_connection_error(&e, config))?;
        debug!("Successfully connected to database");
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| PgcolError::query("connection is closed"))?;

        let start = Instant::now();

        // Describe first so statements without a row description never run.
        let statement = describe(conn, sql)
            .await
            .map_err(|e| PgcolError::query(format_query_error(&e)))?;

        if statement.columns().is_empty() {
            return Err(PgcolError::query(NO_TUPLES_MESSAGE));
        }

        let columns: Vec<ColumnInfo> = statement
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect();
        debug!("Prepared statement with {} column(s)", columns.len());

        let rows = fetch_text_rows(conn, sql)
            .await
            .map_err(|e| PgcolError::query(format_query_error(&e)))?;

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();
        debug!("Fetched {} row(s) in {:?}", rows.len(), start.elapsed());

        Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| PgcolError::connection(format!("failed to close connection: {e}")))?;
            debug!("Connection closed");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

type PgFuture<'c, T> = Pin<Box<dyn Future<Output = sqlx::Result<T>> + Send + 'c>>;

/// Prepares `sql` without executing it.
fn describe<'c, 'q: 'c>(conn: &'c mut PgConnection, sql: &'q str) -> PgFuture<'c, PgStatement<'q>> {
    conn.prepare(sql)
}

/// Runs `sql` over the simple query protocol, which returns every cell as text.
fn fetch_text_rows<'c>(conn: &'c mut PgConnection, sql: &'c str) -> PgFuture<'c, Vec<PgRow>> {
    conn.fetch_all(sqlx::raw_sql(sql))
}

/// Builds sqlx connect options, filling host and port defaults.
fn connect_options(config: &ConnectionConfig) -> Result<PgConnectOptions> {
    let mut options = PgConnectOptions::new()
        .host(config.host.as_deref().unwrap_or(DEFAULT_HOST))
        .port(config.port.unwrap_or(DEFAULT_PORT));

    if let Some(database) = &config.database {
        options = options.database(database);
    }
    if let Some(user) = &config.user {
        options = options.username(user);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    if let Some(mode) = &config.sslmode {
        let mode: PgSslMode = mode
            .parse()
            .map_err(|e| PgcolError::connection(format!("invalid sslmode \"{mode}\": {e}")))?;
        options = options.ssl_mode(mode);
    }
    if let Some(name) = &config.application_name {
        options = options.application_name(name);
    }

    Ok(options)
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// Booleans and integers are decoded. Every other type keeps the server's
/// text exactly, so floats, numerics and bytea print as the server wrote them.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let decoded = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index).map(Value::from),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .map(|v| v.map(i64::from).into()),
        "INT4" => row.try_get::<Option<i32>, _>(index).map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index).map(Value::from),
        "OID" => row
            .try_get::<Option<Oid>, _>(index)
            .map(|v| v.map(|oid| i64::from(oid.0)).into()),
        _ => server_text(row, index),
    };

    decoded.or_else(|_| server_text(row, index)).unwrap_or_else(|e| {
        warn!("Could not decode column {index} of type {type_name}: {e}");
        Value::Null
    })
}

fn server_text(row: &PgRow, index: usize) -> sqlx::Result<Value> {
    row.try_get_unchecked::<Option<String>, _>(index)
        .map(Value::from)
}

/// Returns a remedy for common connection failures.
fn connection_hint(error: &sqlx::Error) -> Option<&'static str> {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        Some("Check that the server is running and accepting TCP connections.")
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        Some("Check your credentials.")
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        Some("Check the database name.")
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        Some("Try sslmode=require, or sslmode=disable for a local server.")
    } else {
        None
    }
}

/// Maps sqlx connection errors to a single-line message naming the target.
fn map_connection_error(error: &sqlx::Error, config: &ConnectionConfig) -> PgcolError {
    let mut message = format!(
        "could not connect to {}: {}",
        config.redacted_conninfo(),
        error
    );
    if let Some(hint) = connection_hint(error) {
        message.push_str(" (");
        message.push_str(hint);
        message.push(')');
    }
    PgcolError::connection(message)
}

/// Formats a query error on one line, with detail and hint if available.
fn format_query_error(error: &sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = format!("ERROR: {}", db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("; DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("; HINT: ");
            result.push_str(hint);
        }
    }

    result
}
