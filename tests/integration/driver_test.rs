//! End-to-end program tests against the mock connector.

use pgcol::app::{run_program, Driver, Stage};
use pgcol::cli::Cli;
use pgcol::config::Config;
use pgcol::db::MockConnector;
use pgcol::error::PgcolError;
use pgcol::scratch;
use pretty_assertions::assert_eq;

fn no_env(_: &str) -> Option<String> {
    None
}

#[tokio::test]
async fn test_full_run_output() {
    let connector = MockConnector::new();
    let mut out = Vec::new();

    run_program(
        &connector,
        &Cli::default(),
        || Ok(Config::default()),
        no_env,
        scratch::reserve_slot,
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Age: 25\nHeight: 1.75\nInitial: M\nHello, World2!\nAge: 1982\nResult: 1\n"
    );
    assert_eq!(connector.stats().queries(), vec!["SELECT 1;"]);
    assert_eq!(connector.stats().open_handles(), 0);
    assert_eq!(connector.stats().close_calls(), 1);
}

#[tokio::test]
async fn test_allocation_failure_stops_before_connecting() {
    let connector = MockConnector::new();
    let mut out = Vec::new();

    let error = run_program(
        &connector,
        &Cli::default(),
        || Ok(Config::default()),
        no_env,
        |slot| slot.try_reserve_exact(usize::MAX),
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(error, PgcolError::Allocation(_)));
    assert!(String::from_utf8(out)
        .unwrap()
        .ends_with("Hello, World2!\nMemory allocation failed\n"));
    assert_eq!(connector.stats().connect_calls(), 0);
}

#[tokio::test]
async fn test_bad_conninfo_fails_after_scratch_output() {
    let connector = MockConnector::new();
    let cli = Cli {
        conninfo: Some("host=localhost colour=blue".to_string()),
        ..Default::default()
    };
    let mut out = Vec::new();

    let error = run_program(
        &connector,
        &cli,
        || Ok(Config::default()),
        no_env,
        scratch::reserve_slot,
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(error, PgcolError::Connection(_)));
    assert!(String::from_utf8(out).unwrap().ends_with("Age: 1982\n"));
    assert_eq!(connector.stats().connect_calls(), 0);
}

#[tokio::test]
async fn test_config_error_comes_after_scratch_output() {
    let connector = MockConnector::new();
    let mut out = Vec::new();

    let error = run_program(
        &connector,
        &Cli::default(),
        || Err(PgcolError::config("Failed to parse config file")),
        no_env,
        scratch::reserve_slot,
        &mut out,
    )
    .await
    .unwrap_err();

    assert!(matches!(error, PgcolError::Config(_)));
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Age: 25\nHeight: 1.75\nInitial: M\nHello, World2!\nAge: 1982\n"
    );
    assert_eq!(connector.stats().connect_calls(), 0);
}

#[tokio::test]
async fn test_configured_query_is_used() {
    let connector = MockConnector::new();
    let config: Config = toml::from_str("[query]\nsql = \"SELECT 42\"\n").unwrap();
    let mut out = Vec::new();

    run_program(
        &connector,
        &Cli::default(),
        || Ok(config),
        no_env,
        scratch::reserve_slot,
        &mut out,
    )
    .await
    .unwrap();

    assert!(String::from_utf8(out).unwrap().ends_with("Result: 42\n"));
}

#[tokio::test]
async fn test_query_failure_releases_connection() {
    let connector = MockConnector::new().failing_query("relation \"t\" does not exist");
    let stats = connector.stats();
    let mut driver = Driver::new(&connector);
    let mut out = Vec::new();

    let error = driver
        .run("dbname=x", "SELECT * FROM t", &mut out)
        .await
        .unwrap_err();

    assert!(matches!(error, PgcolError::Query(_)));
    assert_eq!(driver.stage(), Stage::Failed);
    assert_eq!(stats.queries(), vec!["SELECT * FROM t"]);
    assert_eq!(stats.close_calls(), 1);
    assert_eq!(stats.open_handles(), 0);
}
