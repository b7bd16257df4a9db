//! Command-line argument parsing for sqlgate.

use crate::config::GatewayConfig;
use clap::Parser;
use std::path::PathBuf;

/// Read-only SQL gateway for MySQL.
#[derive(Parser, Debug)]
#[command(name = "sqlgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "SQLGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides config and SQLGATE_BIND)
    #[arg(short = 'b', long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Dotenv file to load before reading the environment
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(GatewayConfig::default_path)
    }

    /// Applies the flags that override configuration.
    pub fn apply_to(&self, config: &mut GatewayConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
    }
}
