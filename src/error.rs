//! Error types for pgcol.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for pgcol operations.
#[derive(Error, Debug)]
pub enum PgcolError {
    /// Database connection errors (bad connection string, host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, statements that return no rows, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad flag values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The scratch block could not reserve its heap slot.
    #[error("Allocation error: {0}")]
    Allocation(String),

    /// Writing program output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PgcolError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an allocation error with the given message.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using PgcolError.
pub type Result<T> = std::result::Result<T, PgcolError>;
