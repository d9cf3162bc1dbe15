//! Mock database client for testing.
//!
//! Provides an in-memory connector whose handles record how they are used,
//! so tests can check that every opened connection is released.

use super::{ColumnInfo, Connector, DatabaseClient, QueryResult, Value, NO_TUPLES_MESSAGE};
use crate::config::ConnectionConfig;
use crate::error::{PgcolError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Leading keywords of statements that never return tuples.
const COMMAND_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER", "TRUNCATE", "SET", "BEGIN",
    "COMMIT", "ROLLBACK", "GRANT", "REVOKE", "VACUUM",
];

/// Counters shared by a mock connector and every handle it opens.
#[derive(Debug, Default)]
pub struct MockStats {
    connects: AtomicUsize,
    open: AtomicUsize,
    closes: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl MockStats {
    /// Number of connect attempts, successful or not.
    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of handles that are open and not yet released.
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Number of explicit `close` calls that released a handle.
    pub fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Statements executed so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

/// A connector that hands out [`MockDatabaseClient`]s.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    stats: Arc<MockStats>,
    connect_error: Option<String>,
    query_error: Option<String>,
    results: HashMap<String, QueryResult>,
}

impl MockConnector {
    /// Creates a connector whose connects succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every connect attempt fail with the given message.
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// Makes every query fail with the given message.
    pub fn failing_query(mut self, message: impl Into<String>) -> Self {
        self.query_error = Some(message.into());
        self
    }

    /// Returns `result` whenever exactly `sql` is executed.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.results.insert(sql.into(), result);
        self
    }

    /// Shared counters for this connector and its handles.
    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect_with(&self, _config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.connect_error {
            return Err(PgcolError::connection(message.clone()));
        }

        self.stats.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDatabaseClient {
            stats: Arc::clone(&self.stats),
            query_error: self.query_error.clone(),
            results: self.results.clone(),
            closed: false,
        }))
    }
}

/// A mock database client that returns predefined results.
#[derive(Debug)]
pub struct MockDatabaseClient {
    stats: Arc<MockStats>,
    query_error: Option<String>,
    results: HashMap<String, QueryResult>,
    closed: bool,
}

impl MockDatabaseClient {
    /// Creates a standalone mock client with its own counters.
    pub fn new() -> Self {
        let stats = Arc::new(MockStats::default());
        stats.open.fetch_add(1, Ordering::SeqCst);
        Self {
            stats,
            query_error: None,
            results: HashMap::new(),
            closed: false,
        }
    }

    fn release(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.stats.open.fetch_sub(1, Ordering::SeqCst);
        true
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockDatabaseClient {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        if self.closed {
            return Err(PgcolError::query("connection is closed"));
        }

        if let Ok(mut queries) = self.stats.queries.lock() {
            queries.push(sql.to_string());
        }

        if let Some(message) = &self.query_error {
            return Err(PgcolError::query(message.clone()));
        }

        if let Some(result) = self.results.get(sql) {
            if result.columns.is_empty() {
                return Err(PgcolError::query(NO_TUPLES_MESSAGE));
            }
            return Ok(result.clone());
        }

        let statement = sql.trim().trim_end_matches(';').trim();
        let first_word = statement.split_whitespace().next().unwrap_or_default();
        let keyword = first_word.to_uppercase();

        if keyword.is_empty() || COMMAND_KEYWORDS.contains(&keyword.as_str()) {
            return Err(PgcolError::query(NO_TUPLES_MESSAGE));
        }

        // `SELECT <integer>` echoes the integer, like the server would.
        let literal = statement[first_word.len()..].trim();
        let (column, value) = match literal.parse::<i64>() {
            Ok(n) if keyword == "SELECT" => (ColumnInfo::new("?column?", "INT4"), Value::Int(n)),
            _ => (
                ColumnInfo::new("result", "TEXT"),
                Value::String(format!("Mock result for: {sql}")),
            ),
        };

        Ok(QueryResult::with_data(vec![column], vec![vec![value]])
            .with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&mut self) -> Result<()> {
        if self.release() {
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
