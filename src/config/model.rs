// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [database]
/// prefix = "tmp"
/// host = "localhost"
/// port = 5432
///
/// [virtualenv]
/// python = "python3"
/// requirements = "requirements.txt"
///
/// [executor]
/// kill_grace = "5s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub virtualenv: VirtualenvSection,

    #[serde(default)]
    pub executor: ExecutorSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub virtualenv: VirtualenvSection,
    pub executor: ExecutorSettings,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        database: DatabaseSection,
        virtualenv: VirtualenvSection,
        executor: ExecutorSettings,
    ) -> Self {
        Self {
            database,
            virtualenv,
            executor,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            DatabaseSection::default(),
            VirtualenvSection::default(),
            ExecutorSettings::default(),
        )
    }
}

/// `[database]` section: where and how temporary databases are created.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    /// Prefix of generated database names.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Program used to create the database.
    #[serde(default = "default_createdb")]
    pub createdb: String,

    /// Program used to drop the database on release.
    #[serde(default = "default_dropdb")]
    pub dropdb: String,

    /// Server host. Unset means libpq's own default.
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub user: Option<String>,
}

fn default_prefix() -> String {
    "tmp".to_string()
}

fn default_encoding() -> String {
    "UTF8".to_string()
}

fn default_createdb() -> String {
    "createdb".to_string()
}

fn default_dropdb() -> String {
    "dropdb".to_string()
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            encoding: default_encoding(),
            createdb: default_createdb(),
            dropdb: default_dropdb(),
            host: None,
            port: None,
            user: None,
        }
    }
}

/// `[virtualenv]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualenvSection {
    /// Program used to create the environment.
    #[serde(default = "default_virtualenv")]
    pub virtualenv: String,

    /// Alternative interpreter handed to `virtualenv --python`.
    #[serde(default)]
    pub python: Option<String>,

    /// Directory in which temporary environments are created.
    ///
    /// Defaults to the system temp directory.
    #[serde(default)]
    pub temp_root: Option<PathBuf>,

    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,
}

fn default_virtualenv() -> String {
    "virtualenv".to_string()
}

fn default_requirements() -> PathBuf {
    PathBuf::from("requirements.txt")
}

impl Default for VirtualenvSection {
    fn default() -> Self {
        Self {
            virtualenv: default_virtualenv(),
            python: None,
            temp_root: None,
            requirements: default_requirements(),
        }
    }
}

/// `[executor]` section as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSection {
    /// How long an interrupted child gets to exit before it is killed,
    /// e.g. `"5s"` or `"500ms"`.
    #[serde(default = "default_kill_grace")]
    pub kill_grace: String,
}

fn default_kill_grace() -> String {
    "5s".to_string()
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            kill_grace: default_kill_grace(),
        }
    }
}

/// Parsed `[executor]` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub kill_grace: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            kill_grace: Duration::from_secs(5),
        }
    }
}
