//! sqlgate - a read-only SQL gateway for MySQL.

use std::sync::Arc;

use anyhow::Context;
use sqlgate::cli::Cli;
use sqlgate::config::GatewayConfig;
use sqlgate::db::{DatabaseConnector, MySqlConnector};
use sqlgate::logging;
use sqlgate::server::{self, AppState};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse_args();

    // Dotenv is loaded before logging so RUST_LOG from the file applies.
    let dotenv = match &cli.env_file {
        Some(path) => dotenvy::from_path(path).map(|_| Some(path.clone())),
        None => dotenvy::dotenv().map(Some).or_else(|e| {
            if e.not_found() {
                Ok(None)
            } else {
                Err(e)
            }
        }),
    };

    match &cli.log_file {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    match dotenv {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            error!("Failed to load environment file: {e}");
            std::process::exit(1);
        }
    }

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = GatewayConfig::load_from_file(&config_path)?;
    config.apply_env_overrides()?;
    cli.apply_to(&mut config);
    config.validate()?;

    info!(
        max_result_rows = config.limits.max_result_rows,
        query_timeout_secs = config.limits.query_timeout_secs,
        max_sql_length = config.limits.max_sql_length,
        "Limits configured"
    );

    let connector = MySqlConnector::new(&config.database);
    info!("Database: {}", connector.describe());
    let state = AppState::from_config(&config, Arc::new(connector))?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::serve(&config, state))?;

    info!("sqlgate stopped");
    Ok(())
}
