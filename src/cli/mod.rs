//! CLI interface for block-race
//!
//! Provides subcommands for:
//! - `run`: Race the configured endpoints until interrupted
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "block-race")]
#[command(about = "Measure which Ethereum RPC endpoint announces new blocks first")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Race the configured endpoints
    Run(RunArgs),
    /// Show configuration
    Config,
}
