// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    /// When set, every mutating call fails with this message.
    fail_writes: Option<String>,
    /// Paths whose writes fail, with the failure message.
    failing_paths: BTreeMap<PathBuf, String>,
}

/// In-memory filesystem for tests.
///
/// Clones share state, so a test can keep a handle while the store owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a file (and its parent directories).
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state();
        if let Some(parent) = path.parent() {
            insert_dir_chain(&mut state.dirs, parent);
        }
        state.files.insert(path, content.into());
    }

    /// Make every subsequent write fail, simulating a full disk or a
    /// permission problem.
    pub fn fail_writes(&self, reason: impl Into<String>) {
        self.state().fail_writes = Some(reason.into());
    }

    /// Make writes to one path fail while everything else keeps working.
    pub fn fail_path(&self, path: impl AsRef<Path>, reason: impl Into<String>) {
        self.state()
            .failing_paths
            .insert(path.as_ref().to_path_buf(), reason.into());
    }

    /// Contents of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state().files.get(path.as_ref()).cloned()
    }

    /// All file paths currently stored, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }

    fn check_writable(state: &MockState, path: &Path) -> Result<()> {
        match state.fail_writes.as_ref().or_else(|| state.failing_paths.get(path)) {
            Some(reason) => Err(anyhow!("write to {:?} failed: {}", path, reason)),
            None => Ok(()),
        }
    }
}

fn insert_dir_chain(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

impl FileSystem for MockFileSystem {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state();
        Self::check_writable(&state, path)?;
        insert_dir_chain(&mut state.dirs, path);
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state();
        let files = state.files.keys();
        let dirs = state.dirs.iter();
        Ok(files
            .chain(dirs)
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        match self.state().files.get(path) {
            Some(content) => Ok(content.len() as u64),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.state();
        Self::check_writable(&state, path)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) {
                return Err(anyhow!("Parent directory missing: {:?}", parent));
            }
        }
        state
            .files
            .entry(path.to_path_buf())
            .or_default()
            .extend_from_slice(contents);
        Ok(())
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.state();
        Self::check_writable(&state, path)?;
        if state.files.contains_key(path) {
            return Err(anyhow!("File already exists: {:?}", path));
        }
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state();
        Self::check_writable(&state, path)?;
        if !state.dirs.contains(path) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }
}
