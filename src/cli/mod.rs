//! CLI interface for rate-feed
//!
//! Provides subcommands for:
//! - `run`: Stream normalized rates to stdout
//! - `normalize`: Replay captured raw frames through an adapter
//! - `config`: Show the effective configuration

mod normalize;
mod run;

pub use normalize::{replay, ExchangeArg, NormalizeArgs, ReplaySummary};
pub use run::{JsonLinesSink, RunArgs};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rate-feed")]
#[command(about = "Real-time crypto exchange rate ingestion and broadcast")]
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
    /// Connect to the exchanges and stream rates as JSON lines
    Run(RunArgs),
    /// Normalize captured frames offline
    Normalize(NormalizeArgs),
    /// Show the effective configuration
    Config,
}
