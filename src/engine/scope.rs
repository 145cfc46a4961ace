// src/engine/scope.rs

use tracing::{debug, info, warn};

use crate::engine::LifecycleState;
use crate::errors::{Result, WithEnvError};
use crate::exec::{ChildOutcome, ScopedExecutor, ShutdownSignals};
use crate::provision::Provisioner;
use crate::types::ChildInvocation;

/// Acquire a resource, run the child against it, release the resource.
pub struct ScopedRun<'a> {
    provisioner: &'a mut dyn Provisioner,
    executor: &'a ScopedExecutor,
    state: LifecycleState,
}

impl<'a> ScopedRun<'a> {
    pub fn new(provisioner: &'a mut dyn Provisioner, executor: &'a ScopedExecutor) -> Self {
        Self {
            provisioner,
            executor,
            state: LifecycleState::NotStarted,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Run `invocation` inside the resource scope.
    ///
    /// Returns the child's outcome when it started. Provisioning failures,
    /// spawn failures and interrupts before the child starts are errors. In
    /// every case the resource has been released when this returns.
    ///
    /// An interrupt during provisioning lets the running step finish for up
    /// to the executor's kill grace before it is abandoned and released.
    pub async fn run(
        &mut self,
        invocation: ChildInvocation,
        signals: &mut ShutdownSignals,
    ) -> Result<ChildOutcome> {
        let kind = self.provisioner.kind();
        debug!(resource = kind, "acquiring resource");

        let grace = self.executor.kill_grace();
        let mut acquire = self.provisioner.acquire();
        let acquired = tokio::select! {
            res = &mut acquire => res.map_err(WithEnvError::from),
            signal = signals.recv() => {
                warn!(resource = kind, %signal, "interrupted while provisioning");
                // A `createdb` killed mid-flight may still commit after the
                // drop has run. Let the current step finish first.
                match tokio::time::timeout(grace, &mut acquire).await {
                    Ok(Ok(_)) => debug!(resource = kind, "provisioning finished; releasing"),
                    Ok(Err(err)) => {
                        let error = format!("{:#}", anyhow::Error::from(err));
                        debug!(resource = kind, %error, "provisioning failed after interrupt");
                    }
                    Err(_) => warn!(
                        resource = kind,
                        ?grace,
                        "provisioning still running after grace period; abandoning it"
                    ),
                }
                Err(WithEnvError::Interrupted(signal))
            }
        };
        drop(acquire);

        let result = match acquired {
            Ok(handle) => {
                self.transition(LifecycleState::ResourceAcquired);
                info!(resource = %handle.resource(), "resource ready");

                let invocation = invocation.with_env(handle.exposure());
                self.transition(LifecycleState::ChildRunning);
                self.executor
                    .run(&invocation, signals)
                    .await
                    .map_err(WithEnvError::from)
            }
            Err(err) => Err(err),
        };

        self.provisioner.release().await;
        self.transition(LifecycleState::ResourceReleased);
        self.transition(LifecycleState::Exited);

        result
    }

    fn transition(&mut self, next: LifecycleState) {
        debug!(from = ?self.state, to = ?next, "lifecycle");
        self.state = next;
    }
}
