// src/provision/database.rs

//! Temporary PostgreSQL database.
//!
//! The database is created with `createdb` and dropped with `dropdb`, so
//! server address and credentials follow libpq conventions. The child sees
//! it as its default database through `PGDATABASE`.

use tracing::{debug, info, warn};

use crate::config::DatabaseSection;
use crate::errors::ProvisionError;
use crate::exec::CommandRunner;
use crate::provision::naming::generate_database_name;
use crate::provision::{AcquireFuture, Provisioner, ReleaseFuture};
use crate::types::{ChildInvocation, EnvOverrides, Resource, ResourceHandle};

pub const PGDATABASE: &str = "PGDATABASE";
pub const PGHOST: &str = "PGHOST";
pub const PGPORT: &str = "PGPORT";
pub const PGUSER: &str = "PGUSER";

#[derive(Debug, Clone, PartialEq, Eq)]
enum DbState {
    Idle,
    /// `createdb` was started but did not report back.
    Pending(String),
    Created(String),
}

pub struct DatabaseProvisioner<R: CommandRunner> {
    config: DatabaseSection,
    runner: R,
    state: DbState,
}

impl<R: CommandRunner> DatabaseProvisioner<R> {
    pub fn new(config: DatabaseSection, runner: R) -> Self {
        Self {
            config,
            runner,
            state: DbState::Idle,
        }
    }

    /// Name of the database currently owned by this provisioner, if any.
    pub fn current_database(&self) -> Option<&str> {
        match &self.state {
            DbState::Idle => None,
            DbState::Pending(name) | DbState::Created(name) => Some(name),
        }
    }

    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(host) = &self.config.host {
            args.push(format!("--host={host}"));
        }
        if let Some(port) = self.config.port {
            args.push(format!("--port={port}"));
        }
        if let Some(user) = &self.config.user {
            args.push(format!("--username={user}"));
        }
        args
    }

    fn createdb_invocation(&self, name: &str) -> ChildInvocation {
        let mut args = vec![format!("--encoding={}", self.config.encoding)];
        args.extend(self.connection_args());
        args.push(name.to_string());
        invocation(&self.config.createdb, args)
    }

    fn dropdb_invocation(&self, name: &str, if_exists: bool) -> ChildInvocation {
        let mut args = self.connection_args();
        if if_exists {
            args.push("--if-exists".to_string());
        }
        args.push(name.to_string());
        invocation(&self.config.dropdb, args)
    }

    /// Environment through which the child reaches the database.
    pub fn exposure(&self, name: &str) -> EnvOverrides {
        let mut env = EnvOverrides::new();
        env.set(PGDATABASE, name);
        if let Some(host) = &self.config.host {
            env.set(PGHOST, host);
        }
        if let Some(port) = self.config.port {
            env.set(PGPORT, port.to_string());
        }
        if let Some(user) = &self.config.user {
            env.set(PGUSER, user);
        }
        env
    }
}

fn invocation(program: &str, args: Vec<String>) -> ChildInvocation {
    ChildInvocation {
        program: program.into(),
        args: args.into_iter().map(Into::into).collect(),
        env: EnvOverrides::new(),
    }
}

impl<R: CommandRunner> Provisioner for DatabaseProvisioner<R> {
    fn kind(&self) -> &'static str {
        "database"
    }

    fn acquire(&mut self) -> AcquireFuture<'_> {
        Box::pin(async move {
            if let Some(name) = self.current_database() {
                return Err(ProvisionError::AlreadyAcquired(name.to_string()));
            }

            let name = generate_database_name(&self.config.prefix);
            info!(database = %name, "creating database");

            let create = self.createdb_invocation(&name);
            self.state = DbState::Pending(name.clone());

            if let Err(err) = self.runner.run("createdb", &create).await {
                // Nothing was created under our name; a collision must not
                // lead to dropping someone else's database.
                self.state = DbState::Idle;
                return Err(err);
            }

            self.state = DbState::Created(name.clone());
            let exposure = self.exposure(&name);
            Ok(ResourceHandle::new(Resource::Database { name }, exposure))
        })
    }

    fn release(&mut self) -> ReleaseFuture<'_> {
        Box::pin(async move {
            let (name, if_exists) = match std::mem::replace(&mut self.state, DbState::Idle) {
                DbState::Idle => {
                    debug!("no database to drop");
                    return;
                }
                DbState::Pending(name) => (name, true),
                DbState::Created(name) => (name, false),
            };

            info!(database = %name, "dropping database");
            let drop = self.dropdb_invocation(&name, if_exists);
            if let Err(err) = self.runner.run("dropdb", &drop).await {
                let error = format!("{:#}", anyhow::Error::from(err));
                warn!(database = %name, %error, "failed to drop database");
            }
        })
    }
}
