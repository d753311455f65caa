// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for the `opactivity` host simulator.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "opactivity",
    version,
    about = "Simulate operational activities for a set of players.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Activity.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Activity.toml")]
    pub config: String,

    /// Number of periodic sweeps to run before exiting.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub ticks: u32,

    /// Override `[engine].tick_interval_ms`.
    #[arg(long, value_name = "MS")]
    pub tick_interval_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `OPACTIVITY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print activities, but don't simulate.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
