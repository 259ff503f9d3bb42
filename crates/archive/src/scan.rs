//! Directory listing helpers.
//!
//! The archive layout is only ever inspected one level at a time: episode
//! directories under `meta/`, part directories under an episode, and the
//! entries of media and build directories.

use std::path::Path;
use walkdir::WalkDir;

use crate::error::{ArchiveError, Result};

/// Names of all entries directly inside `dir`, in directory order.
pub fn entry_names(dir: &Path) -> Result<Vec<String>> {
    list(dir, |_| true)
}

/// Names of the subdirectories directly inside `dir`.
///
/// Symlinks to directories count as directories.
pub fn sub_dir_names(dir: &Path) -> Result<Vec<String>> {
    list(dir, |path| path.is_dir())
}

fn list(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(ArchiveError::missing_dir(dir));
    }

    let mut names = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ArchiveError::io(dir, e.into()))?;

        if keep(entry.path()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Ok(names)
}
