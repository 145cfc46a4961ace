// src/config/validate.rs

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::config::model::{
    ConfigFile, DatabaseSection, ExecutorSettings, RawConfigFile, VirtualenvSection,
};
use crate::errors::{Result, WithEnvError};

/// Longest accepted prefix. Generated names append `_<14 digits>_<pid>`,
/// and PostgreSQL truncates identifiers past 63 bytes.
pub const MAX_PREFIX_LEN: usize = 32;

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("prefix pattern is valid")
});

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WithEnvError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_database(&raw.database)?;
        validate_virtualenv(&raw.virtualenv)?;
        let kill_grace = parse_duration(&raw.executor.kill_grace).map_err(|e| {
            WithEnvError::ConfigError(format!("[executor].kill_grace: {e}"))
        })?;

        Ok(ConfigFile::new_unchecked(
            raw.database,
            raw.virtualenv,
            ExecutorSettings { kill_grace },
        ))
    }
}

/// Check a database name prefix, whether it came from the file or the CLI.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() > MAX_PREFIX_LEN {
        return Err(WithEnvError::ConfigError(format!(
            "database prefix '{prefix}' is longer than {MAX_PREFIX_LEN} characters"
        )));
    }
    if !PREFIX_RE.is_match(prefix) {
        return Err(WithEnvError::ConfigError(format!(
            "database prefix '{prefix}' must start with a letter or '_' and contain only \
             letters, digits and '_'"
        )));
    }
    Ok(())
}

fn validate_database(db: &DatabaseSection) -> Result<()> {
    validate_prefix(&db.prefix)?;
    ensure_not_blank("[database].encoding", &db.encoding)?;
    ensure_not_blank("[database].createdb", &db.createdb)?;
    ensure_not_blank("[database].dropdb", &db.dropdb)?;
    if db.port == Some(0) {
        return Err(WithEnvError::ConfigError(
            "[database].port must be between 1 and 65535 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_virtualenv(venv: &VirtualenvSection) -> Result<()> {
    ensure_not_blank("[virtualenv].virtualenv", &venv.virtualenv)?;
    if let Some(python) = &venv.python {
        ensure_not_blank("[virtualenv].python", python)?;
    }
    if venv.requirements.as_os_str().is_empty() {
        return Err(WithEnvError::ConfigError(
            "[virtualenv].requirements must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn ensure_not_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WithEnvError::ConfigError(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

/// Parse durations like `"500ms"`, `"5s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m or h"
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}
