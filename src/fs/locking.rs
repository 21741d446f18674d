//! File locking utilities for state shared between ramp processes
//!
//! The CLI and a long-running UI server may operate on the same project at
//! once. Two kinds of `fs2` advisory locks keep them apart:
//!
//! - [`ProjectLock`]: held for the whole of an Up/Down/Rename/Rebase/Prune
//!   call so that two operations never race on the same worktree directory.
//! - [`locked_update`]: a read-modify-write of one JSON state file under a
//!   sidecar `<file>.lock`, so each update is atomic with respect to other
//!   updaters.
//!
//! Advisory locks are cooperative: every writer must go through these helpers.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the project-wide lock file inside `.ramp/`
const PROJECT_LOCK_FILE: &str = ".lock";

/// Exclusive, project-scoped lock. Released on drop.
#[derive(Debug)]
pub struct ProjectLock {
    file: File,
    path: PathBuf,
}

impl ProjectLock {
    /// Acquire the lock for the project whose state lives in `ramp_dir`.
    ///
    /// Blocks until any other holder releases it.
    pub fn acquire(ramp_dir: &Path) -> Result<Self> {
        fs::create_dir_all(ramp_dir)
            .with_context(|| format!("Failed to create {}", ramp_dir.display()))?;
        let path = ramp_dir.join(PROJECT_LOCK_FILE);
        let file = open_lock_file(&path)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() != fs2::lock_contended_error().raw_os_error() {
                return Err(e).with_context(|| format!("Failed to lock {}", path.display()));
            }
            tracing::info!(lock = %path.display(), "waiting for another ramp operation to finish");
            file.lock_exclusive()
                .with_context(|| format!("Failed to acquire project lock: {}", path.display()))?;
        }

        tracing::debug!(lock = %path.display(), "project lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(lock = %self.path.display(), "failed to release project lock: {e}");
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    #[allow(clippy::suspicious_open_options)]
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open lock file: {}", path.display()))
}

fn sidecar_lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// Read a state file under a shared lock. Returns `None` when it does not exist.
pub fn locked_read(path: &Path) -> Result<Option<String>> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            return Ok(None);
        }
    }
    let lock = open_lock_file(&sidecar_lock_path(path))?;
    lock.lock_shared()
        .with_context(|| format!("Failed to acquire shared lock: {}", path.display()))?;
    let content = match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read file: {}", path.display()))
        }
    };
    Ok(content)
}

/// Read-modify-write a state file under an exclusive lock.
///
/// `update` receives the current content (`None` if the file does not exist)
/// and returns the new content plus a value handed back to the caller. The
/// new content replaces the file atomically (temp file + rename). When
/// `update` fails the file is left untouched.
pub fn locked_update<T, F>(path: &Path, update: F) -> Result<T>
where
    F: FnOnce(Option<&str>) -> Result<(String, T)>,
{
    let parent = path
        .parent()
        .with_context(|| format!("State file has no parent directory: {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let lock = open_lock_file(&sidecar_lock_path(path))?;
    lock.lock_exclusive()
        .with_context(|| format!("Failed to acquire exclusive lock: {}", path.display()))?;

    let current = match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read file: {}", path.display()))
        }
    };

    let (content, value) = update(current.as_deref())?;
    atomic_write(path, &content)?;
    Ok(value)
}

/// Replace a file's content atomically via a temp file in the same directory
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("File has no parent directory: {}", path.display()))?;
    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    temp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to sync temp file for {}", path.display()))?;
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
