// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod provision;
pub mod types;

use tracing::debug;

use crate::cli::{NewdbArgs, ReqArgs};
use crate::config::validate::validate_prefix;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::ScopedRun;
use crate::errors::{Result, WithEnvError};
use crate::exec::{RealCommandRunner, ScopedExecutor, ShutdownSignals};
use crate::fs::RealFileSystem;
use crate::provision::{DatabaseProvisioner, Provisioner, VirtualenvProvisioner};
use crate::types::ChildInvocation;

/// Entry point for `with-newdb`. Returns the exit code for the process.
pub async fn run_newdb(args: NewdbArgs) -> Result<i32> {
    let mut cfg = load_or_default(args.common.config.as_deref())?;
    if let Some(prefix) = args.prefix {
        validate_prefix(&prefix)?;
        cfg.database.prefix = prefix;
    }

    let mut provisioner = DatabaseProvisioner::new(cfg.database.clone(), RealCommandRunner);
    run_in_scope(&mut provisioner, &cfg, args.command).await
}

/// Entry point for `with-req`. Returns the exit code for the process.
pub async fn run_req(args: ReqArgs) -> Result<i32> {
    let mut cfg = load_or_default(args.common.config.as_deref())?;
    if let Some(requirements) = args.requirements {
        cfg.virtualenv.requirements = requirements;
    }
    if let Some(python) = args.python {
        cfg.virtualenv.python = Some(python);
    }

    let mut provisioner = VirtualenvProvisioner::new(
        cfg.virtualenv.clone(),
        std::env::var_os("PATH"),
        RealCommandRunner,
        RealFileSystem,
    );
    run_in_scope(&mut provisioner, &cfg, args.command).await
}

/// Shared tail of both wrappers: install signal listeners, then run the
/// command inside the provisioner's scope.
pub async fn run_in_scope(
    provisioner: &mut dyn Provisioner,
    cfg: &ConfigFile,
    command: Vec<std::ffi::OsString>,
) -> Result<i32> {
    let invocation = ChildInvocation::from_argv(command)
        .ok_or_else(|| WithEnvError::ConfigError("no command given".to_string()))?;

    // Listeners go in before anything is provisioned, so an early Ctrl-C
    // still takes the teardown path.
    let mut signals = ShutdownSignals::install()?;
    let executor = ScopedExecutor::new(cfg.executor);

    let mut scope = ScopedRun::new(provisioner, &executor);
    let outcome = scope.run(invocation, &mut signals).await?;
    debug!(state = ?scope.state(), exit_code = outcome.exit_code(), "done");
    Ok(outcome.exit_code())
}
