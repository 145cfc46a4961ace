// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// The slice of the filesystem the virtualenv provisioner touches.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// True for anything that resolves, including pipes and devices.
    fn exists(&self, path: &Path) -> bool;
    /// True only for regular files.
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a new, uniquely named directory `<root>/<prefix>XXXXXX` and
    /// return its path. The directory is not removed automatically.
    fn create_temp_dir(&self, root: &Path, prefix: &str) -> Result<PathBuf>;

    /// Recursively delete a directory tree.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

/// Backed by `std::fs` and `tempfile`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_temp_dir(&self, root: &Path, prefix: &str) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(root)
            .with_context(|| format!("creating a temporary directory in {}", root.display()))?;
        Ok(dir.keep())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).with_context(|| format!("removing {}", path.display()))
    }
}
