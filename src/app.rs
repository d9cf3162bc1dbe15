//! Program flow: resolve settings, then connect, query, print and release.

use crate::cli::Cli;
use crate::config::{Config, ConnectionConfig};
use crate::db::{parse_connection_string, Connector, DatabaseClient};
use crate::error::{PgcolError, Result};
use crate::output::print_first_column;
use crate::scratch;
use std::collections::TryReserveError;
use std::io::Write;
use tracing::{debug, info, warn};

/// Where the driver is in its connect → query → print sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Connected,
    Queried,
    Done,
    Failed,
}

/// Runs one statement over one connection and prints its first column.
pub struct Driver<'a> {
    connector: &'a dyn Connector,
    stage: Stage,
}

impl<'a> Driver<'a> {
    /// Creates a driver that opens its connection through `connector`.
    pub fn new(connector: &'a dyn Connector) -> Self {
        Self {
            connector,
            stage: Stage::Start,
        }
    }

    /// Current stage. `Done` and `Failed` are terminal.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        debug!("{:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    /// Connects with `conninfo`, runs `sql` and writes column 0 of each row to `out`.
    ///
    /// The connection is closed on every path once it has been opened.
    pub async fn run<W: Write>(&mut self, conninfo: &str, sql: &str, out: &mut W) -> Result<()> {
        if self.stage != Stage::Start {
            return Err(PgcolError::internal("driver has already run"));
        }

        let mut client = match self.connector.connect(conninfo).await {
            Ok(client) => client,
            Err(e) => {
                self.advance(Stage::Failed);
                return Err(e);
            }
        };
        self.advance(Stage::Connected);

        let outcome = self.query_and_print(&mut *client, sql, out).await;
        let closed = client.close().await;
        drop(client);

        match (outcome, closed) {
            (Ok(()), Ok(())) => {
                self.advance(Stage::Done);
                Ok(())
            }
            (Ok(()), Err(e)) => {
                self.advance(Stage::Failed);
                Err(e)
            }
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!("Closing connection after failure also failed: {close_err}");
                }
                self.advance(Stage::Failed);
                Err(e)
            }
        }
    }

    async fn query_and_print<W: Write>(
        &mut self,
        client: &mut dyn DatabaseClient,
        sql: &str,
        out: &mut W,
    ) -> Result<()> {
        let result = client.execute_query(sql).await?;
        self.advance(Stage::Queried);
        if let Some(column) = result.columns.first() {
            debug!(
                "{} row(s) in {:?}, printing column \"{}\" ({})",
                result.row_count(),
                result.execution_time,
                column.name,
                column.data_type
            );
        }
        print_first_column(&result, out)
    }
}

/// Prints the scratch values, then loads the config, resolves settings and
/// runs one driver pass.
///
/// Nothing connects if the scratch block fails. `load_config` runs only after
/// the scratch values have been printed.
pub async fn run_program<W, F>(
    connector: &dyn Connector,
    cli: &Cli,
    load_config: impl FnOnce() -> Result<Config>,
    env: impl Fn(&str) -> Option<String>,
    reserve: F,
    out: &mut W,
) -> Result<()>
where
    W: Write,
    F: FnOnce(&mut Vec<i32>) -> std::result::Result<(), TryReserveError>,
{
    scratch::print_scratch_values(out, reserve)?;

    let config = load_config()?;
    let connection = resolve_connection(cli, &config, env)?;
    let sql = resolve_query(cli, &config);
    info!("Connection: {}", connection.display_string());

    Driver::new(connector)
        .run(&connection.to_conninfo(), &sql, out)
        .await
}

/// Resolves the connection settings from CLI args, config file, and environment.
///
/// Precedence, highest first: connection string argument, named connection,
/// `default` connection from the config file, `DATABASE_URL`. Individual
/// flags then override single fields and `PG*` variables fill the gaps. With
/// nothing configured at all the placeholder connection is used.
pub fn resolve_connection(
    cli: &Cli,
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ConnectionConfig> {
    let mut connection = match &cli.conninfo {
        Some(conninfo) => Some(parse_connection_string(conninfo)?),
        None => None,
    };

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(PgcolError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    if connection.is_none() {
        connection = env("DATABASE_URL")
            .map(|url| parse_connection_string(&url))
            .transpose()?;
    }

    let mut connection = connection.unwrap_or_default();
    connection.merge(&cli.flag_overrides());
    connection.apply_env_defaults_from(&env);

    if connection.is_empty() {
        warn!("No database connection configured, using placeholder settings");
        connection = ConnectionConfig::placeholder();
    }

    Ok(connection)
}

/// Resolves the statement to run.
pub fn resolve_query(cli: &Cli, config: &Config) -> String {
    cli.query
        .clone()
        .unwrap_or_else(|| config.query.sql.clone())
}
