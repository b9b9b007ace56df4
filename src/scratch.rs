//! Per-request scratch files
//!
//! Every file handed out by [`ScratchDir::acquire`] is owned by exactly one
//! [`ScratchFile`] guard and is deleted exactly once: either by an explicit
//! [`ScratchFile::release`] or when the guard is dropped.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;

/// Tags used for scratch file names
pub const SCRATCH_TAGS: [&str; 3] = ["input", "intermediate", "output"];

/// Handle to the directory that holds scratch files
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: Arc<PathBuf>,
}

impl ScratchDir {
    /// Open (and create if needed) a scratch directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Allocate a new, empty, uniquely named file.
    ///
    /// `create_new` makes a name collision an error instead of a silent
    /// reuse of another request's file.
    pub fn acquire(&self, tag: &str) -> Result<ScratchFile> {
        let path = self.root.join(format!("{}-{}", tag, Uuid::new_v4()));
        OpenOptions::new().write(true).create_new(true).open(&path)?;
        tracing::trace!(path = %path.display(), "scratch file acquired");
        Ok(ScratchFile {
            path,
            released: false,
        })
    }

    /// Delete scratch files left behind by an earlier process, e.g. after a
    /// crash. Only names produced by [`ScratchDir::acquire`] are touched.
    pub fn purge_stale(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(self.root.as_path())? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let ours = SCRATCH_TAGS
                .iter()
                .any(|tag| name.starts_with(&format!("{}-", tag)));
            if !ours || !entry.file_type()?.is_file() {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "failed to remove stale scratch file"
                ),
            }
        }
        Ok(removed)
    }

    /// Number of entries currently in the directory
    #[cfg(test)]
    pub fn entry_count(&self) -> Result<usize> {
        Ok(std::fs::read_dir(self.root.as_path())?.count())
    }
}

/// A scratch file exclusively owned by one request
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    released: bool,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        // Also runs from Drop on runtime worker threads; one unlink per file.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "scratch file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch file"
            ),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.remove();
    }
}
