// src/logging.rs

//! `tracing` subscriber setup for the host binary.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (applies to every target)
//! 2. `OPACTIVITY_LOG`, in `EnvFilter` directive syntax
//!    (e.g. `info,opactivity::template=debug`)
//! 3. `info`
//!
//! Output goes to stderr; stdout is reserved for the dry-run listing.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "OPACTIVITY_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(Level::from(level).as_str());
    }
    match env.map(EnvFilter::try_new) {
        Some(Ok(filter)) => filter,
        Some(Err(e)) => {
            eprintln!("ignoring invalid {LOG_ENV}: {e}");
            EnvFilter::new("info")
        }
        None => EnvFilter::new("info"),
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Debug), Some("error"));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn env_directives_are_kept() {
        let filter = build_filter(None, Some("warn,opactivity::registry=trace"));
        let rendered = filter.to_string();
        assert!(rendered.contains("opactivity::registry=trace"));
        assert!(rendered.contains("warn"));
    }

    #[test]
    fn invalid_env_falls_back_to_info() {
        let filter = build_filter(None, Some("opactivity=loud"));
        assert_eq!(filter.to_string(), "info");
    }
}
