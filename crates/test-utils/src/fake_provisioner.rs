use with_env::errors::ProvisionError;
use with_env::provision::{AcquireFuture, Provisioner, ReleaseFuture};
use with_env::types::{EnvOverrides, Resource, ResourceHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Succeed,
    Fail,
    Hang,
}

/// A provisioner that creates nothing and records what was asked of it.
#[derive(Debug)]
pub struct FakeProvisioner {
    mode: Mode,
    exposure: EnvOverrides,
    live: bool,
    acquires: usize,
    releases: usize,
    teardowns: usize,
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self {
            mode: Mode::Succeed,
            exposure: EnvOverrides::new(),
            live: false,
            acquires: 0,
            releases: 0,
            teardowns: 0,
        }
    }

    /// `acquire` fails after marking the resource half-created.
    pub fn failing() -> Self {
        Self {
            mode: Mode::Fail,
            ..Self::new()
        }
    }

    /// `acquire` never completes.
    pub fn hanging() -> Self {
        Self {
            mode: Mode::Hang,
            ..Self::new()
        }
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.exposure.set(key, value);
        self
    }

    pub fn acquires(&self) -> usize {
        self.acquires
    }

    /// Number of `release` calls, including no-ops.
    pub fn releases(&self) -> usize {
        self.releases
    }

    /// Number of `release` calls that actually tore something down.
    pub fn teardowns(&self) -> usize {
        self.teardowns
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

impl Default for FakeProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl Provisioner for FakeProvisioner {
    fn kind(&self) -> &'static str {
        "fake"
    }

    fn acquire(&mut self) -> AcquireFuture<'_> {
        Box::pin(async move {
            self.acquires += 1;
            self.live = true;
            match self.mode {
                Mode::Succeed => Ok(ResourceHandle::new(
                    Resource::Database {
                        name: "fake_db".to_string(),
                    },
                    self.exposure.clone(),
                )),
                Mode::Fail => Err(ProvisionError::CommandFailed {
                    step: "fake",
                    program: "fake".to_string(),
                    status: failed_status(),
                }),
                Mode::Hang => std::future::pending().await,
            }
        })
    }

    fn release(&mut self) -> ReleaseFuture<'_> {
        Box::pin(async move {
            self.releases += 1;
            if std::mem::replace(&mut self.live, false) {
                self.teardowns += 1;
            }
        })
    }
}

#[cfg(unix)]
fn failed_status() -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(1 << 8)
}

#[cfg(windows)]
fn failed_status() -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(1)
}
