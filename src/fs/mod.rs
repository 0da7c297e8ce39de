// src/fs/mod.rs

//! Filesystem seam used by the log store.
//!
//! The store only ever needs a handful of operations: list a directory, read
//! a file's size, append bytes, create a file once, and remove a whole run
//! directory. Content is never read back before writing.

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Permission bits for every log file the store creates.
pub const LOG_FILE_MODE: u32 = 0o600;

/// Permission bits for directories the store creates.
pub const LOG_DIR_MODE: u32 = 0o700;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    /// Create `path` and any missing parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Return the entries of a directory as full paths.
    ///
    /// A directory that does not exist yet has no entries.
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Current size of a file in bytes.
    fn file_size(&self, path: &Path) -> Result<u64>;

    /// Append `contents` to the end of `path` in a single write, creating the
    /// file (owner read/write only) if needed.
    fn append(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create a new file holding `contents`; fails if it already exists.
    fn create_new(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Remove a directory and everything below it.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    fn is_dir(&self, path: &Path) -> bool;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl RealFileSystem {
    fn open_options() -> fs::OpenOptions {
        let mut opts = fs::OpenOptions::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(LOG_FILE_MODE);
        }
        opts
    }
}

impl FileSystem for RealFileSystem {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(LOG_DIR_MODE);
        }
        builder
            .create(path)
            .with_context(|| format!("creating dir {:?}", path))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry.with_context(|| format!("reading entry in {:?}", path))?;
            entries.push(entry.path());
        }
        Ok(entries)
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        let meta = fs::metadata(path).with_context(|| format!("stat {:?}", path))?;
        Ok(meta.len())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut file = Self::open_options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening {:?} for append", path))?;
        file.write_all(contents)
            .with_context(|| format!("appending to {:?}", path))?;
        Ok(())
    }

    fn create_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut file = Self::open_options()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents)
            .with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).with_context(|| format!("removing dir {:?}", path))
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
