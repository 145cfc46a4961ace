// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WithEnvError};

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "WITH_ENV_CONFIG";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        WithEnvError::ConfigError(format!("cannot read {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Default config file looked up in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("with-env.toml")
}

/// Decide which config file to read, if any.
///
/// 1. explicit `--config` path (must exist)
/// 2. `WITH_ENV_CONFIG` environment variable (must exist)
/// 3. `with-env.toml` in the current directory, only if present
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let default = default_config_path();
    default.is_file().then_some(default)
}

/// Load the resolved config file, or fall back to built-in defaults.
pub fn load_or_default(cli_path: Option<&Path>) -> Result<ConfigFile> {
    match resolve_config_path(cli_path) {
        Some(path) => {
            debug!(config = %path.display(), "loading config file");
            load_and_validate(&path)
        }
        None => {
            debug!("no config file; using defaults");
            Ok(ConfigFile::default())
        }
    }
}
