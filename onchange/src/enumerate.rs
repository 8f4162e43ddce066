//! Directory enumeration and registration.
//!
//! The notifier watches each directory non-recursively, so every directory in
//! the tree has to be registered on its own. Symbolic links are not followed:
//! a link to a directory is neither registered nor descended into.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::notifier::{Result, WatcherError};

/// Something directories can be registered with.
///
/// Implemented by [`crate::notifier::Notifier`]; tests use an in-memory fake.
pub trait Registrar {
    /// Starts watching `dir` (non-recursively).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be watched.
    fn register(&mut self, dir: &Path) -> Result<()>;
}

/// Returns `root` followed by every directory beneath it.
///
/// Files are skipped. A root without subdirectories yields just the root.
///
/// # Errors
///
/// Returns [`WatcherError::Walk`] if any part of the tree cannot be read.
/// Partial results are never returned.
pub fn enumerate_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| WatcherError::Walk {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }

    Ok(dirs)
}

/// Enumerates the tree under `root` and registers every directory.
///
/// Stops at the first failure so that the tree is never watched partially.
/// Returns the number of directories registered.
///
/// # Errors
///
/// Returns the enumeration error, or [`WatcherError::Register`] naming the
/// directory that could not be registered.
pub fn register_tree<R: Registrar + ?Sized>(root: &Path, registrar: &mut R) -> Result<usize> {
    let dirs = enumerate_directories(root)?;

    for dir in &dirs {
        registrar.register(dir)?;
        debug!(dir = %dir.display(), "Registered directory");
    }

    info!(root = %root.display(), count = dirs.len(), "Registered directory tree");

    Ok(dirs.len())
}
