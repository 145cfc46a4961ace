// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `CommandRunner` trait used by provisioners to
//!   run helper programs (`createdb`, `virtualenv`, `pip`, ...), with a
//!   `RealCommandRunner` for production that tests can replace.
//! - [`child`] runs the user's nested command and turns its exit status
//!   into the wrapper's exit code.
//! - [`signal`] listens for interrupt/terminate signals so the wrapper can
//!   tear down its resource before exiting.

use std::process::ExitStatus;

pub mod backend;
pub mod child;
pub mod signal;

pub use backend::{CommandRunner, RealCommandRunner};
pub use child::ScopedExecutor;
pub use signal::{ShutdownKind, ShutdownSignals};

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    /// Exited normally with this code.
    Exited(i32),
    /// Terminated by this signal number.
    Signaled(i32),
}

impl ChildOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ChildOutcome::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ChildOutcome::Signaled(signal);
            }
        }
        ChildOutcome::Exited(1)
    }

    /// Exit code for the wrapper; signals follow the shell's `128 + N`.
    pub fn exit_code(self) -> i32 {
        match self {
            ChildOutcome::Exited(code) => code,
            ChildOutcome::Signaled(signal) => 128 + signal,
        }
    }

    pub fn success(self) -> bool {
        self == ChildOutcome::Exited(0)
    }
}
