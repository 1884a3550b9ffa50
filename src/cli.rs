//! CLI definitions for Vigil.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vigil CLI.
#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Validator liveness monitoring and alerting daemon")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Monitor configured validators in the foreground (default)
    Monitor {
        /// Seconds between polling rounds
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },

    /// Load the config, validate it and print effective thresholds
    ValidateConfig,
}
