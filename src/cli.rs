// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Both wrappers take their own flags first and then the nested command.
//! The first positional argument ends flag parsing: everything after it,
//! including arguments that look like flags, belongs to the child. This is
//! what lets the wrappers nest (`with-newdb with-req -r reqs.txt pytest -x`).

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

/// Flags shared by every wrapper.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Path to a TOML config file.
    ///
    /// Default: `$WITH_ENV_CONFIG`, then `with-env.toml` if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WITH_ENV_LOG` or `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Show what's happening (same as `--log-level debug`).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Command-line arguments for `with-newdb`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "with-newdb",
    version,
    about = "Run a program with a new, empty PostgreSQL database as its default database.",
    long_about = "Run a program with a new, empty PostgreSQL database as its default \
                  database.\n\nThe database is created with `createdb`, exposed to the \
                  program as PGDATABASE (the database `psql` connects to without \
                  arguments) and dropped with `dropdb` when the program exits."
)]
pub struct NewdbArgs {
    /// New database name prefix.
    ///
    /// Overrides `[database].prefix`; the built-in default is `tmp`.
    #[arg(short, long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Program to run, followed by its arguments.
    #[arg(
        value_name = "PROGRAM",
        required = true,
        num_args = 1..,
        trailing_var_arg = true
    )]
    pub command: Vec<OsString>,
}

/// Command-line arguments for `with-req`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "with-req",
    version,
    about = "Run a program within a temporary Python virtualenv with the packages from a requirements file.",
    long_about = None
)]
pub struct ReqArgs {
    /// File to read requirements from.
    ///
    /// Overrides `[virtualenv].requirements`; the built-in default is
    /// `requirements.txt`.
    #[arg(short, long, value_name = "REQUIREMENTS.TXT")]
    pub requirements: Option<PathBuf>,

    /// Alternative Python interpreter for the virtualenv.
    #[arg(short, long, value_name = "PYTHON")]
    pub python: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Program to run in the virtualenv (`bash` is a useful value),
    /// followed by its arguments.
    #[arg(
        value_name = "PROGRAM",
        required = true,
        num_args = 1..,
        trailing_var_arg = true
    )]
    pub command: Vec<OsString>,
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
