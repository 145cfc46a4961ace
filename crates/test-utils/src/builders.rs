#![allow(dead_code)]

use std::path::Path;

use with_env::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.config.database.prefix = prefix.to_string();
        self
    }

    pub fn createdb(mut self, program: &str) -> Self {
        self.config.database.createdb = program.to_string();
        self
    }

    pub fn dropdb(mut self, program: &str) -> Self {
        self.config.database.dropdb = program.to_string();
        self
    }

    pub fn server(mut self, host: &str, port: u16, user: &str) -> Self {
        self.config.database.host = Some(host.to_string());
        self.config.database.port = Some(port);
        self.config.database.user = Some(user.to_string());
        self
    }

    pub fn virtualenv(mut self, program: &str) -> Self {
        self.config.virtualenv.virtualenv = program.to_string();
        self
    }

    pub fn python(mut self, python: &str) -> Self {
        self.config.virtualenv.python = Some(python.to_string());
        self
    }

    pub fn temp_root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.virtualenv.temp_root = Some(root.as_ref().to_path_buf());
        self
    }

    pub fn requirements(mut self, path: impl AsRef<Path>) -> Self {
        self.config.virtualenv.requirements = path.as_ref().to_path_buf();
        self
    }

    pub fn kill_grace(mut self, grace: &str) -> Self {
        self.config.executor.kill_grace = grace.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
