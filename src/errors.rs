// src/errors.rs

//! Crate-wide error types and the exit codes they map to.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::exec::ShutdownKind;

/// Exit code used when the wrapper fails before the child starts
/// (bad configuration, provisioning failure).
pub const EXIT_SETUP_FAILED: i32 = 125;

/// Exit code used when the child could not be started for a reason other
/// than a missing executable.
pub const EXIT_CANNOT_EXECUTE: i32 = 126;

/// Exit code used when the child executable was not found.
pub const EXIT_NOT_FOUND: i32 = 127;

/// The external resource could not be created.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("resource already acquired: {0}")]
    AlreadyAcquired(String),

    #[error("requirements file not found: {}", .0.display())]
    MissingRequirements(PathBuf),

    #[error("{step}: {message}")]
    Io { step: &'static str, message: String },

    #[error("{step} could not be started ({program})")]
    CommandSpawn {
        step: &'static str,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{step} failed ({program}): {status}")]
    CommandFailed {
        step: &'static str,
        program: String,
        status: ExitStatus,
    },
}

/// The child command could not be started.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("could not run {program}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ProvisionError {
    /// Wrap a filesystem failure, keeping its context chain in the message.
    pub fn io(step: &'static str, err: anyhow::Error) -> Self {
        ProvisionError::Io {
            step,
            message: format!("{err:#}"),
        }
    }
}

impl SpawnError {
    pub fn from_io(program: impl Into<String>, err: io::Error) -> Self {
        let program = program.into();
        match err.kind() {
            io::ErrorKind::NotFound => SpawnError::NotFound(program),
            io::ErrorKind::PermissionDenied => SpawnError::PermissionDenied(program),
            _ => SpawnError::Io {
                program,
                source: err,
            },
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            SpawnError::NotFound(_) => EXIT_NOT_FOUND,
            _ => EXIT_CANNOT_EXECUTE,
        }
    }
}

/// Wrapped errors are exposed as `source()` only, so an `{:#}` chain
/// prints each message once.
#[derive(Error, Debug)]
pub enum WithEnvError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error")]
    IoError(#[from] std::io::Error),

    #[error("invalid config file")]
    TomlError(#[from] toml::de::Error),

    #[error("provisioning failed")]
    Provision(#[from] ProvisionError),

    #[error("could not start the command")]
    Spawn(#[from] SpawnError),

    #[error("Interrupted by {0} before the command started")]
    Interrupted(ShutdownKind),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WithEnvError {
    /// Exit code the wrapper process should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            WithEnvError::Spawn(err) => err.exit_code(),
            WithEnvError::Interrupted(kind) => kind.exit_code(),
            _ => EXIT_SETUP_FAILED,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WithEnvError>;
