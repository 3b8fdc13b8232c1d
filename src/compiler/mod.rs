//! Shared compilation helpers: file collection and freshness checks.

pub mod assets;
pub mod pages;

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};
use walkdir::WalkDir;

/// Collect all regular files under a directory (recursive).
///
/// Returns an empty list when the directory does not exist.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Check whether `dest` is newer than `source` and any shared dependency.
///
/// Missing files and unreadable mtimes count as stale.
pub fn is_up_to_date(source: &Path, dest: &Path, deps_mtime: Option<SystemTime>) -> bool {
    let Some(dest_mtime) = mtime(dest) else {
        return false;
    };
    let Some(source_mtime) = mtime(source) else {
        return false;
    };
    if source_mtime > dest_mtime {
        return false;
    }
    if deps_mtime.is_some_and(|deps| deps > dest_mtime) {
        return false;
    }
    true
}

/// Modification time of a path, if readable.
pub fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
