//! pgcol - connect to PostgreSQL, run one query, print the first column.

use pgcol::app::run_program;
use pgcol::cli::Cli;
use pgcol::config::Config;
use pgcol::db::PostgresConnector;
use pgcol::error::Result;
use pgcol::{logging, scratch};
use tracing::{debug, error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }

    let config_path = cli.config_path();
    let load_config = || {
        info!("Loading config from: {}", config_path.display());
        Config::load_from_file(&config_path)
    };

    let mut stdout = std::io::stdout().lock();
    run_program(
        &PostgresConnector,
        &cli,
        load_config,
        |key| std::env::var(key).ok(),
        scratch::reserve_slot,
        &mut stdout,
    )
    .await
}
