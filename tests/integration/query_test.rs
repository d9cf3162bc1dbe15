//! Query execution integration tests.
//!
//! Tests SQL query execution and result handling against a live server.

use pgcol::db::{Connector, DatabaseClient, PostgresConnector, Value};
use pgcol::error::PgcolError;
use pgcol::output::print_first_column;

/// Helper to create a test client.
async fn get_test_client() -> Option<Box<dyn DatabaseClient>> {
    let url = std::env::var("DATABASE_URL").ok()?;
    PostgresConnector.connect(&url).await.ok()
}

#[tokio::test]
async fn test_select_one_prints_result_one() {
    let Some(mut client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client.execute_query("SELECT 1;").await.unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.column_count(), 1);

    let mut out = Vec::new();
    print_first_column(&result, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Result: 1\n");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_rows_come_back_in_order() {
    let Some(mut client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT n, n * 10 FROM generate_series(1, 3) AS n ORDER BY n DESC")
        .await
        .unwrap();

    let first_column: Vec<Value> = result.rows.iter().map(|row| row[0].clone()).collect();
    assert_eq!(
        first_column,
        vec![Value::Int(3), Value::Int(2), Value::Int(1)]
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_empty_result_is_tuples() {
    let Some(mut client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .execute_query("SELECT 1 WHERE false")
        .await
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.column_count(), 1);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_ddl_is_rejected_without_running() {
    let Some(mut client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let create = client
        .execute_query("CREATE TEMP TABLE pgcol_probe (n int)")
        .await;
    assert!(matches!(create, Err(PgcolError::Query(_))));

    // The table must not exist: the statement was described, never run.
    let probe = client.execute_query("SELECT n FROM pgcol_probe").await;
    assert!(matches!(probe, Err(PgcolError::Query(_))));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_syntax_error() {
    let Some(mut client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let error = client.execute_query("SELEC 1").await.unwrap_err();
    assert!(matches!(error, PgcolError::Query(_)));
    assert!(error.to_string().contains("syntax error"));
    assert!(!error.to_string().contains('\n'));

    client.close().await.unwrap();
}
