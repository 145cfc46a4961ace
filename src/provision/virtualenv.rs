// src/provision/virtualenv.rs

//! Temporary Python virtualenv populated from a requirements file.
//!
//! Acquire:
//! 1. check that the requirements file exists; pipes and devices such as
//!    `/dev/stdin` or `<(...)` are accepted and left for pip to read
//! 2. create a fresh `pytmpenv*` directory under the temp root
//! 3. `virtualenv --quiet [--python PY] <dir>`
//! 4. `<dir>/bin/pip install -r <requirements> --quiet`, skipped when the
//!    file declares no requirements
//!
//! Any failure after step 2 removes the directory again. The child sees the
//! environment as if it had been activated: `VIRTUAL_ENV` points at the root
//! and its `bin` directory leads `PATH`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::VirtualenvSection;
use crate::errors::ProvisionError;
use crate::exec::CommandRunner;
use crate::fs::FileSystem;
use crate::provision::{AcquireFuture, Provisioner, ReleaseFuture};
use crate::types::{ChildInvocation, EnvOverrides, Resource, ResourceHandle};

pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
pub const PATH: &str = "PATH";
pub const PYTHONHOME: &str = "PYTHONHOME";

/// Prefix of temporary virtualenv directories.
pub const TEMP_DIR_PREFIX: &str = "pytmpenv";

#[cfg(windows)]
pub const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
pub const BIN_DIR: &str = "bin";

pub struct VirtualenvProvisioner<R: CommandRunner, F: FileSystem> {
    config: VirtualenvSection,
    temp_root: PathBuf,
    inherited_path: Option<OsString>,
    runner: R,
    fs: F,
    live: Option<PathBuf>,
}

impl<R: CommandRunner, F: FileSystem> VirtualenvProvisioner<R, F> {
    /// `inherited_path` is the `PATH` the child would otherwise see; the
    /// virtualenv's `bin` directory is put in front of it.
    pub fn new(
        config: VirtualenvSection,
        inherited_path: Option<OsString>,
        runner: R,
        fs: F,
    ) -> Self {
        let temp_root = config
            .temp_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        Self {
            config,
            temp_root,
            inherited_path,
            runner,
            fs,
            live: None,
        }
    }

    /// Root of the virtualenv currently owned by this provisioner, if any.
    pub fn current_dir(&self) -> Option<&Path> {
        self.live.as_deref()
    }

    pub fn requirements(&self) -> &Path {
        &self.config.requirements
    }

    /// Environment through which the child uses the virtualenv.
    pub fn exposure(&self, root: &Path) -> Result<EnvOverrides, ProvisionError> {
        let mut dirs = vec![root.join(BIN_DIR)];
        if let Some(path) = &self.inherited_path {
            dirs.extend(std::env::split_paths(path));
        }
        let path = std::env::join_paths(dirs)
            .map_err(|e| ProvisionError::io("building PATH", anyhow::Error::new(e)))?;

        let mut env = EnvOverrides::new();
        env.set(VIRTUAL_ENV, root.as_os_str())
            .set(PATH, path)
            .unset(PYTHONHOME);
        Ok(env)
    }

    fn virtualenv_invocation(&self, root: &Path) -> ChildInvocation {
        let mut args: Vec<OsString> = vec!["--quiet".into()];
        if let Some(python) = &self.config.python {
            args.push("--python".into());
            args.push(python.into());
        }
        args.push(root.as_os_str().to_owned());
        ChildInvocation {
            program: self.config.virtualenv.clone().into(),
            args,
            env: EnvOverrides::new(),
        }
    }

    fn pip_invocation(&self, root: &Path, exposure: &EnvOverrides) -> ChildInvocation {
        let pip = if cfg!(windows) { "pip.exe" } else { "pip" };
        ChildInvocation {
            program: root.join(BIN_DIR).join(pip).into_os_string(),
            args: vec![
                "install".into(),
                "-r".into(),
                self.config.requirements.as_os_str().to_owned(),
                "--quiet".into(),
            ],
            env: exposure.clone(),
        }
    }

    /// `requirements` is `None` when the file is a stream that only pip may
    /// consume; pip always runs in that case.
    async fn install(
        &self,
        root: &Path,
        requirements: Option<&str>,
        exposure: &EnvOverrides,
    ) -> Result<(), ProvisionError> {
        info!(dir = %root.display(), "installing virtualenv");
        self.runner
            .run("virtualenv", &self.virtualenv_invocation(root))
            .await?;

        if requirements.is_some_and(|contents| !declares_requirements(contents)) {
            debug!(
                requirements = %self.config.requirements.display(),
                "requirements file is empty; skipping pip"
            );
            return Ok(());
        }

        info!(
            requirements = %self.config.requirements.display(),
            "installing requirements"
        );
        self.runner
            .run("pip install", &self.pip_invocation(root, exposure))
            .await
    }
}

/// True when at least one line is neither blank nor a `#` comment.
pub fn declares_requirements(contents: &str) -> bool {
    contents.lines().map(str::trim).any(|line| !line.is_empty() && !line.starts_with('#'))
}

impl<R: CommandRunner, F: FileSystem> Provisioner for VirtualenvProvisioner<R, F> {
    fn kind(&self) -> &'static str {
        "virtualenv"
    }

    fn acquire(&mut self) -> AcquireFuture<'_> {
        Box::pin(async move {
            if let Some(dir) = &self.live {
                return Err(ProvisionError::AlreadyAcquired(dir.display().to_string()));
            }

            let requirements_path = self.config.requirements.clone();
            if !self.fs.exists(&requirements_path) || self.fs.is_dir(&requirements_path) {
                return Err(ProvisionError::MissingRequirements(requirements_path));
            }
            let requirements = if self.fs.is_file(&requirements_path) {
                let contents = self
                    .fs
                    .read_to_string(&requirements_path)
                    .map_err(|e| ProvisionError::io("reading requirements", e))?;
                Some(contents)
            } else {
                debug!(
                    requirements = %requirements_path.display(),
                    "requirements come from a stream; leaving it to pip"
                );
                None
            };

            let root = self
                .fs
                .create_temp_dir(&self.temp_root, TEMP_DIR_PREFIX)
                .map_err(|e| ProvisionError::io("creating virtualenv directory", e))?;
            debug!(dir = %root.display(), "created temporary directory");
            self.live = Some(root.clone());

            let installed = match self.exposure(&root) {
                Ok(exposure) => self
                    .install(&root, requirements.as_deref(), &exposure)
                    .await
                    .map(|()| exposure),
                Err(err) => Err(err),
            };

            match installed {
                Ok(exposure) => Ok(ResourceHandle::new(Resource::Virtualenv { root }, exposure)),
                Err(err) => {
                    info!(dir = %root.display(), "provisioning failed; removing directory");
                    self.release().await;
                    Err(err)
                }
            }
        })
    }

    fn release(&mut self) -> ReleaseFuture<'_> {
        Box::pin(async move {
            let Some(root) = self.live.take() else {
                debug!("no virtualenv to remove");
                return;
            };

            info!(dir = %root.display(), "removing virtualenv");
            if let Err(err) = self.fs.remove_dir_all(&root) {
                let error = format!("{err:#}");
                warn!(dir = %root.display(), %error, "failed to remove virtualenv");
            }
        })
    }
}
