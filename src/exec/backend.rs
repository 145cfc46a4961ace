// src/exec/backend.rs

//! Pluggable runner for helper commands.
//!
//! Provisioners never spawn processes themselves; they hand a
//! [`ChildInvocation`] to a `CommandRunner`. Production code uses
//! [`RealCommandRunner`]; tests provide a fake that records invocations and
//! scripts their outcomes.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::errors::ProvisionError;
use crate::types::ChildInvocation;

/// Trait abstracting how helper commands are executed.
pub trait CommandRunner: Send + Sync {
    /// Run `invocation` to completion. `step` names the provisioning step for
    /// logs and errors (e.g. `"createdb"`).
    ///
    /// A non-zero exit status is an error.
    fn run<'a>(
        &'a self,
        step: &'static str,
        invocation: &'a ChildInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProvisionError>> + Send + 'a>>;
}

/// Runs helper commands as real processes.
///
/// Their stdout is sent to our stderr so the wrapped command's stdout stays
/// usable in pipelines. Stdin is inherited, so `pip install -r /dev/stdin`
/// reads what was piped into the wrapper.
#[derive(Debug, Clone, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run<'a>(
        &'a self,
        step: &'static str,
        invocation: &'a ChildInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProvisionError>> + Send + 'a>> {
        Box::pin(async move {
            debug!(step, cmd = %invocation.display_command(), "running helper command");

            let mut cmd = invocation.to_command();
            cmd.stdout(std::io::stderr()).kill_on_drop(true);

            let status = cmd
                .status()
                .await
                .map_err(|source| ProvisionError::CommandSpawn {
                    step,
                    program: invocation.display_program(),
                    source,
                })?;

            debug!(step, success = status.success(), code = ?status.code(), "helper command exited");

            if !status.success() {
                return Err(ProvisionError::CommandFailed {
                    step,
                    program: invocation.display_program(),
                    status,
                });
            }
            Ok(())
        })
    }
}
