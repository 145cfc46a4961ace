// src/exec/child.rs

//! Runs the nested command.

use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::config::ExecutorSettings;
use crate::errors::SpawnError;
use crate::exec::signal::{ShutdownKind, ShutdownSignals};
use crate::exec::ChildOutcome;
use crate::types::ChildInvocation;

/// Spawns the child with the resource exposure applied and waits for it.
///
/// The child inherits stdin/stdout/stderr. If a shutdown signal arrives
/// while it runs, the signal is forwarded, the child gets `kill_grace` to
/// exit on its own, and is killed after that.
#[derive(Debug, Clone)]
pub struct ScopedExecutor {
    kill_grace: Duration,
}

impl ScopedExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self {
            kill_grace: settings.kill_grace,
        }
    }

    pub fn kill_grace(&self) -> Duration {
        self.kill_grace
    }

    pub async fn run(
        &self,
        invocation: &ChildInvocation,
        signals: &mut ShutdownSignals,
    ) -> Result<ChildOutcome, SpawnError> {
        let program = invocation.display_program();
        info!(cmd = %invocation.display_command(), "starting command");

        let mut cmd = invocation.to_command();
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| SpawnError::from_io(program.clone(), e))?;

        let status = tokio::select! {
            status = child.wait() => status,
            kind = signals.recv() => {
                info!(signal = %kind, pid = ?child.id(), "shutdown requested; stopping command");
                self.stop(&mut child, kind).await
            }
        };

        let status = status.map_err(|source| SpawnError::Io {
            program: program.clone(),
            source,
        })?;
        let outcome = ChildOutcome::from_status(status);

        info!(
            exit_code = outcome.exit_code(),
            success = outcome.success(),
            "command exited"
        );
        Ok(outcome)
    }

    async fn stop(
        &self,
        child: &mut Child,
        kind: ShutdownKind,
    ) -> std::io::Result<std::process::ExitStatus> {
        forward_signal(child, kind);

        match tokio::time::timeout(self.kill_grace, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                warn!(
                    grace = ?self.kill_grace,
                    "command still running after grace period; killing it"
                );
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "failed to kill command");
                }
                child.wait().await
            }
        }
    }
}

#[cfg(unix)]
fn forward_signal(child: &Child, kind: ShutdownKind) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        debug!("command already reaped; nothing to signal");
        return;
    };
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(raw), kind.as_nix()) {
        debug!(pid, signal = %kind, error = %e, "could not forward signal");
    }
}

#[cfg(not(unix))]
fn forward_signal(_child: &Child, kind: ShutdownKind) {
    debug!(signal = %kind, "signal forwarding unsupported on this platform");
}
