// src/logging.rs

//! Diagnostics go to stderr through `tracing`; stdout belongs to the child.
//!
//! The wrappers are quiet by default. The level comes from, in order:
//! `--log-level`, `-v` (debug), `WITH_ENV_LOG`, and finally `warn`.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no level is given on the CLI.
pub const LOG_ENV_VAR: &str = "WITH_ENV_LOG";

/// Install the global subscriber. Call once, before provisioning.
pub fn init_logging(cli_level: Option<LogLevel>, verbose: bool) -> Result<()> {
    let env_level = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, verbose, env_level.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

fn resolve_level(cli_level: Option<LogLevel>, verbose: bool, env_value: Option<&str>) -> Level {
    match (cli_level, verbose) {
        (Some(lvl), _) => lvl.into(),
        (None, true) => Level::DEBUG,
        // Unparseable values are ignored rather than aborting the wrapper.
        (None, false) => env_value
            .and_then(|v| Level::from_str(v.trim()).ok())
            .unwrap_or(Level::WARN),
    }
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
