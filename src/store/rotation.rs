// src/store/rotation.rs

//! Size-based rotation of a log stream over numbered files.
//!
//! A stream `{directory}/{basename}{N}{suffix}` always writes to its most
//! recent file (natural sort) until that file reaches `max_size_bytes`, then
//! moves on to `N + 1`. Files are never truncated or removed here.
//!
//! Resolving the target and appending to it are separate steps. Two
//! processes sharing a stream can both pick a file that is just under the
//! threshold and both append to it, so a file may end up larger than
//! `max_size_bytes`. The threshold is a soft bound.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use tracing::debug;

use crate::errors::{PlaylogError, Result};
use crate::fs::FileSystem;

static NATURAL_CHUNK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+|\D+").ok());

/// Compare two names so that embedded numbers order numerically
/// (`audit2.yml` < `audit10.yml`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let Some(chunk) = NATURAL_CHUNK.as_ref() else {
        return a.cmp(b);
    };
    let mut left = chunk.find_iter(a).map(|m| m.as_str());
    let mut right = chunk.find_iter(b).map(|m| m.as_str());

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = compare_chunks(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_chunks(l: &str, r: &str) -> Ordering {
    let l_digits = l.bytes().all(|b| b.is_ascii_digit());
    let r_digits = r.bytes().all(|b| b.is_ascii_digit());
    if l_digits && r_digits {
        let l_trim = l.trim_start_matches('0');
        let r_trim = r.trim_start_matches('0');
        l_trim
            .len()
            .cmp(&r_trim.len())
            .then_with(|| l_trim.cmp(r_trim))
            .then_with(|| l.len().cmp(&r.len()))
    } else {
        l.cmp(r)
    }
}

/// Escape glob metacharacters so `s` matches itself literally.
fn glob_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' | '\\' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}

/// A rotating log stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub directory: PathBuf,
    pub basename: String,
    pub suffix: String,
    pub max_size_bytes: u64,
}

impl LogFile {
    pub fn new(
        directory: impl Into<PathBuf>,
        basename: impl Into<String>,
        suffix: impl Into<String>,
        max_size_bytes: u64,
    ) -> Self {
        Self {
            directory: directory.into(),
            basename: basename.into(),
            suffix: suffix.into(),
            max_size_bytes,
        }
    }

    pub fn path_for(&self, sequence: u64) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", self.basename, sequence, self.suffix))
    }

    fn matcher(&self) -> Result<GlobMatcher> {
        let pattern = format!(
            "{}*{}",
            glob_literal(&self.basename),
            glob_literal(&self.suffix)
        );
        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                PlaylogError::ConfigError(format!("invalid log file pattern {pattern:?}: {e}"))
            })?;
        Ok(glob.compile_matcher())
    }

    /// Sequence number encoded in a file name of this stream, if any.
    pub fn sequence_of(&self, path: &Path) -> Option<u64> {
        let name = path.file_name()?.to_str()?;
        name.strip_prefix(self.basename.as_str())?
            .strip_suffix(self.suffix.as_str())?
            .parse()
            .ok()
    }

    /// Existing files of this stream, oldest first (natural sort).
    pub fn existing_files(&self, fs: &dyn FileSystem) -> Result<Vec<PathBuf>> {
        let matcher = self.matcher()?;
        let mut files: Vec<PathBuf> = fs
            .list_dir(&self.directory)?
            .into_iter()
            .filter(|p| !fs.is_dir(p))
            .filter(|p| p.file_name().is_some_and(|n| matcher.is_match(n)))
            .collect();
        files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
        Ok(files)
    }

    /// File the next write should go to.
    ///
    /// - no file yet: sequence 1
    /// - most recent file under the threshold: that file
    /// - otherwise: one past the highest sequence seen
    pub fn resolve_target(&self, fs: &dyn FileSystem) -> Result<PathBuf> {
        let files = self.existing_files(fs)?;
        let Some(latest) = files.last() else {
            return Ok(self.path_for(1));
        };

        let size = fs.file_size(latest)?;
        if size < self.max_size_bytes {
            return Ok(latest.clone());
        }

        let next = files
            .iter()
            .filter_map(|p| self.sequence_of(p))
            .max()
            .unwrap_or(0)
            + 1;
        let target = self.path_for(next);
        debug!(
            from = %latest.display(),
            to = %target.display(),
            size,
            max = self.max_size_bytes,
            "rotating log file"
        );
        Ok(target)
    }
}
