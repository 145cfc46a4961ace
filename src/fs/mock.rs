// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
    /// A pipe or device: present, but neither a regular file nor readable
    /// here.
    Stream,
}

/// In-memory filesystem for provisioner tests.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    next_temp: Arc<AtomicUsize>,
    fail_removal: Arc<Mutex<bool>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut entries, parent);
        }
        entries.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_stream(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut entries, parent);
        }
        entries.insert(path, MockEntry::Stream);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_dirs(&mut entries, path.as_ref());
    }

    /// Make every subsequent `remove_dir_all` fail.
    pub fn fail_removals(&self) {
        *self.fail_removal.lock().unwrap() = true;
    }

    /// Snapshot of every path currently present, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let entries = self.entries.lock().unwrap();
        let mut paths: Vec<PathBuf> = entries.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn ensure_dirs(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Dir);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            Some(MockEntry::Stream) => Err(anyhow!("Stream is consumed by pip, not read here: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(entries.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let entries = self.entries.lock().unwrap();
        matches!(entries.get(path), Some(MockEntry::Dir))
    }

    fn create_temp_dir(&self, root: &Path, prefix: &str) -> Result<PathBuf> {
        if !self.is_dir(root) {
            bail!("Not a directory or not found: {:?}", root);
        }
        let n = self.next_temp.fetch_add(1, Ordering::SeqCst);
        let dir = root.join(format!("{prefix}{n:06}"));
        self.add_dir(&dir);
        Ok(dir)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        if *self.fail_removal.lock().unwrap() {
            bail!("simulated removal failure: {:?}", path);
        }
        let mut entries = self.entries.lock().unwrap();
        if !matches!(entries.get(path), Some(MockEntry::Dir)) {
            bail!("Not a directory or not found: {:?}", path);
        }
        entries.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}
