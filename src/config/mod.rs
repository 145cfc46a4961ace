// src/config/mod.rs

//! Configuration loading and validation for the wrappers.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate values before any resource is touched (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default, resolve_config_path};
pub use model::{
    ConfigFile, DatabaseSection, ExecutorSection, ExecutorSettings, RawConfigFile,
    VirtualenvSection,
};
pub use validate::parse_duration;
