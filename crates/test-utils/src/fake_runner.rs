use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use with_env::errors::ProvisionError;
use with_env::exec::CommandRunner;
use with_env::types::{ChildInvocation, EnvOverrides};

/// One helper command the fake was asked to run.
#[derive(Debug, Clone)]
pub struct RecordedCommand {
    pub step: &'static str,
    pub program: String,
    pub args: Vec<String>,
    pub env: EnvOverrides,
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<RecordedCommand>,
    failures: HashMap<&'static str, i32>,
    blocked: HashSet<&'static str>,
    delays: HashMap<&'static str, Duration>,
}

/// A fake command runner that:
/// - records every helper command it is asked to run
/// - succeeds unless a step was scripted to fail, block or take a while.
///
/// Clones share state, so a test can keep one clone for inspection and hand
/// the other to a provisioner.
#[derive(Debug, Clone, Default)]
pub struct FakeCommandRunner {
    inner: Arc<Mutex<Inner>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `step` exit with `code`.
    pub fn fail_step(&self, step: &'static str, code: i32) {
        self.inner.lock().unwrap().failures.insert(step, code);
    }

    /// Make `step` hang forever, as an interrupted helper would.
    pub fn block_step(&self, step: &'static str) {
        self.inner.lock().unwrap().blocked.insert(step);
    }

    /// Make `step` take `delay` before it reports back.
    pub fn delay_step(&self, step: &'static str, delay: Duration) {
        self.inner.lock().unwrap().delays.insert(step, delay);
    }

    pub fn calls(&self) -> Vec<RecordedCommand> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn steps(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.step).collect()
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run<'a>(
        &'a self,
        step: &'static str,
        invocation: &'a ChildInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<(), ProvisionError>> + Send + 'a>> {
        let inner = Arc::clone(&self.inner);

        Box::pin(async move {
            let (failure, blocked, delay) = {
                let mut guard = inner.lock().unwrap();
                guard.calls.push(RecordedCommand {
                    step,
                    program: invocation.display_program(),
                    args: invocation
                        .args
                        .iter()
                        .map(|a| a.to_string_lossy().into_owned())
                        .collect(),
                    env: invocation.env.clone(),
                });
                (
                    guard.failures.get(step).copied(),
                    guard.blocked.contains(step),
                    guard.delays.get(step).copied(),
                )
            };

            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if blocked {
                std::future::pending::<()>().await;
            }

            match failure {
                Some(code) => Err(ProvisionError::CommandFailed {
                    step,
                    program: invocation.display_program(),
                    status: exit_status(code),
                }),
                None => Ok(()),
            }
        })
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}
