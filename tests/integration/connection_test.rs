//! Connection integration tests.
//!
//! Tests database connectivity and error handling.

use pgcol::config::ConnectionConfig;
use pgcol::db::{Connector, DatabaseClient, MockConnector, PostgresConnector};
use pgcol::error::PgcolError;

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

#[tokio::test]
async fn test_connect_with_valid_conninfo() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut client = PostgresConnector.connect(&url).await.unwrap();
    assert!(!client.is_closed());
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_connect_with_key_value_form() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let conninfo = ConnectionConfig::parse(&url).unwrap().to_conninfo();
    let mut client = PostgresConnector.connect(&conninfo).await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_two_connections_are_independent() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut first = PostgresConnector.connect(&url).await.unwrap();
    let mut second = PostgresConnector.connect(&url).await.unwrap();

    first.close().await.unwrap();
    assert!(first.is_closed());
    assert!(!second.is_closed());

    let result = second.execute_query("SELECT 1;").await.unwrap();
    assert_eq!(result.text(0, 0), "1");
    second.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_host() {
    let conninfo =
        "host=invalid.host.that.does.not.exist.local dbname=testdb user=testuser password=testpass connect_timeout=5";

    let error = PostgresConnector.connect(conninfo).await.err().unwrap();
    assert!(matches!(error, PgcolError::Connection(_)));

    let message = error.to_string();
    assert!(message.contains("invalid.host.that.does.not.exist.local"));
    assert!(!message.contains("testpass"));
}

#[tokio::test]
async fn test_connect_with_malformed_conninfo() {
    for conninfo in ["", "host", "port=abc", "colour=blue", "mysql://localhost/db"] {
        let error = PostgresConnector.connect(conninfo).await.err().unwrap();
        assert!(
            matches!(error, PgcolError::Connection(_)),
            "{conninfo:?} gave {error:?}"
        );
    }
}

#[tokio::test]
async fn test_mock_connections_are_independent() {
    let connector = MockConnector::new();
    let stats = connector.stats();

    let mut first = connector.connect("dbname=a").await.unwrap();
    let mut second = connector.connect("dbname=a").await.unwrap();
    assert_eq!(stats.open_handles(), 2);

    first.close().await.unwrap();
    assert_eq!(stats.open_handles(), 1);
    assert!(second.execute_query("SELECT 1").await.is_ok());

    second.close().await.unwrap();
    assert_eq!(stats.open_handles(), 0);
    assert_eq!(stats.close_calls(), 2);
}

#[tokio::test]
async fn test_failed_connect_leaks_nothing() {
    let connector = MockConnector::new().failing_connect("connection refused");
    let stats = connector.stats();

    assert!(connector.connect("dbname=a").await.is_err());
    assert!(connector.connect("dbname=a").await.is_err());

    assert_eq!(stats.connect_calls(), 2);
    assert_eq!(stats.open_handles(), 0);
}
