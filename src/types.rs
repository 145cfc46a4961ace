// src/types.rs

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// Environment changes layered on top of the inherited environment.
///
/// Setting a key cancels an earlier removal of the same key and vice versa,
/// so the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    set: BTreeMap<OsString, OsString>,
    unset: BTreeSet<OsString>,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> &mut Self {
        let key = key.into();
        self.unset.remove(&key);
        self.set.insert(key, value.into());
        self
    }

    pub fn unset(&mut self, key: impl Into<OsString>) -> &mut Self {
        let key = key.into();
        self.set.remove(&key);
        self.unset.insert(key);
        self
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.set.get(key.as_ref()).map(OsString::as_os_str)
    }

    pub fn is_unset(&self, key: impl AsRef<OsStr>) -> bool {
        self.unset.contains(key.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Layer `other` on top of `self`; `other` wins on collisions.
    pub fn merge(&mut self, other: &EnvOverrides) {
        for key in &other.unset {
            self.unset(key.clone());
        }
        for (key, value) in &other.set {
            self.set(key.clone(), value.clone());
        }
    }

    pub fn vars(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.set.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    pub fn removed(&self) -> impl Iterator<Item = &OsStr> {
        self.unset.iter().map(OsString::as_os_str)
    }

    /// Apply to a command that otherwise inherits the parent environment.
    pub fn apply(&self, cmd: &mut Command) {
        for key in &self.unset {
            cmd.env_remove(key);
        }
        cmd.envs(&self.set);
    }
}

/// What was provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// A freshly created, empty database.
    Database { name: String },
    /// Root directory of a freshly created virtualenv.
    Virtualenv { root: PathBuf },
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Database { name } => write!(f, "database {name}"),
            Resource::Virtualenv { root } => write!(f, "virtualenv {}", root.display()),
        }
    }
}

/// A provisioned resource together with the environment through which the
/// child process reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    resource: Resource,
    exposure: EnvOverrides,
}

impl ResourceHandle {
    pub fn new(resource: Resource, exposure: EnvOverrides) -> Self {
        Self { resource, exposure }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn exposure(&self) -> &EnvOverrides {
        &self.exposure
    }

    pub fn database_name(&self) -> Option<&str> {
        match &self.resource {
            Resource::Database { name } => Some(name),
            Resource::Virtualenv { .. } => None,
        }
    }

    pub fn virtualenv_root(&self) -> Option<&Path> {
        match &self.resource {
            Resource::Virtualenv { root } => Some(root),
            Resource::Database { .. } => None,
        }
    }
}

/// The nested command line, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildInvocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: EnvOverrides,
}

impl ChildInvocation {
    /// Build from a full argv (`argv[0]` is the program).
    ///
    /// Returns `None` for an empty argv.
    pub fn from_argv<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut iter = argv.into_iter().map(Into::into);
        let program = iter.next()?;
        Some(Self {
            program,
            args: iter.collect(),
            env: EnvOverrides::new(),
        })
    }

    pub fn with_env(mut self, env: &EnvOverrides) -> Self {
        self.env.merge(env);
        self
    }

    pub fn display_program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Human-readable command line for logging.
    pub fn display_command(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        self.env.apply(&mut cmd);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_override_wins() {
        let mut base = EnvOverrides::new();
        base.set("PGDATABASE", "a").unset("PYTHONHOME");

        let mut top = EnvOverrides::new();
        top.set("PGDATABASE", "b").set("PYTHONHOME", "/opt/py");

        base.merge(&top);
        assert_eq!(base.get("PGDATABASE"), Some(OsStr::new("b")));
        assert_eq!(base.get("PYTHONHOME"), Some(OsStr::new("/opt/py")));
        assert!(!base.is_unset("PYTHONHOME"));
    }

    #[test]
    fn unset_cancels_set() {
        let mut env = EnvOverrides::new();
        env.set("X", "1").unset("X");
        assert_eq!(env.get("X"), None);
        assert!(env.is_unset("X"));
        assert_eq!(env.vars().count(), 0);
    }

    #[test]
    fn argv_keeps_flag_like_arguments() {
        let inv = ChildInvocation::from_argv(["with-req", "-r", "reqs.txt", "pytest", "-x"])
            .expect("non-empty argv");
        assert_eq!(inv.program, OsString::from("with-req"));
        assert_eq!(inv.args.len(), 4);
        assert_eq!(inv.display_command(), "with-req -r reqs.txt pytest -x");
        assert!(ChildInvocation::from_argv(Vec::<OsString>::new()).is_none());
    }
}
