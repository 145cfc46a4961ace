// src/exec/signal.rs

//! Shutdown signal handling.
//!
//! Listeners are installed before the resource is acquired. From that point
//! on an interrupt no longer kills the wrapper outright; it is delivered
//! through [`ShutdownSignals::recv`] and the teardown path runs first.

use std::fmt;
use std::io;

use tokio::sync::mpsc;

/// Which shutdown request arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGHUP.
    Hangup,
}

impl ShutdownKind {
    /// Conventional signal number, used for the `128 + N` exit code.
    pub fn signal_number(self) -> i32 {
        match self {
            ShutdownKind::Hangup => 1,
            ShutdownKind::Interrupt => 2,
            ShutdownKind::Terminate => 15,
        }
    }

    pub fn exit_code(self) -> i32 {
        128 + self.signal_number()
    }

    #[cfg(unix)]
    pub(crate) fn as_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal;
        match self {
            ShutdownKind::Interrupt => Signal::SIGINT,
            ShutdownKind::Terminate => Signal::SIGTERM,
            ShutdownKind::Hangup => Signal::SIGHUP,
        }
    }
}

impl fmt::Display for ShutdownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownKind::Interrupt => "SIGINT",
            ShutdownKind::Terminate => "SIGTERM",
            ShutdownKind::Hangup => "SIGHUP",
        };
        f.write_str(name)
    }
}

enum Source {
    #[cfg(unix)]
    Os {
        interrupt: tokio::signal::unix::Signal,
        terminate: tokio::signal::unix::Signal,
        hangup: tokio::signal::unix::Signal,
    },
    #[cfg(not(unix))]
    CtrlC,
    Channel(mpsc::Receiver<ShutdownKind>),
}

/// Stream of shutdown requests.
pub struct ShutdownSignals {
    source: Source,
}

impl fmt::Debug for ShutdownSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = if matches!(self.source, Source::Channel(_)) {
            "channel"
        } else {
            "os"
        };
        f.debug_struct("ShutdownSignals").field("source", &source).finish()
    }
}

impl ShutdownSignals {
    /// Register OS signal listeners. Must be called inside a tokio runtime.
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            source: Source::Os {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
                hangup: signal(SignalKind::hangup())?,
            },
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            source: Source::CtrlC,
        })
    }

    /// Signals fed from a channel instead of the OS. Used by tests and by
    /// embedders that manage signals themselves.
    pub fn from_channel(rx: mpsc::Receiver<ShutdownKind>) -> Self {
        Self {
            source: Source::Channel(rx),
        }
    }

    /// Wait for the next shutdown request. Never resolves if the source is
    /// exhausted.
    pub async fn recv(&mut self) -> ShutdownKind {
        match &mut self.source {
            #[cfg(unix)]
            Source::Os {
                interrupt,
                terminate,
                hangup,
            } => {
                tokio::select! {
                    Some(()) = interrupt.recv() => ShutdownKind::Interrupt,
                    Some(()) = terminate.recv() => ShutdownKind::Terminate,
                    Some(()) = hangup.recv() => ShutdownKind::Hangup,
                    else => std::future::pending().await,
                }
            }
            #[cfg(not(unix))]
            Source::CtrlC => match tokio::signal::ctrl_c().await {
                Ok(()) => ShutdownKind::Interrupt,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to listen for Ctrl+C");
                    std::future::pending().await
                }
            },
            Source::Channel(rx) => match rx.recv().await {
                Some(kind) => kind,
                None => std::future::pending().await,
            },
        }
    }
}
