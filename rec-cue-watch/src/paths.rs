//! Desired-path normalization for the watcher registry.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Registry key for `path`: case-insensitive on every platform.
pub fn folder_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Make `path` absolute and drop `.` / `..` components lexically.
///
/// Symlinks are not resolved. Returns `None` if the current directory is
/// needed but unavailable.
pub fn absolute_folder(path: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).ok()?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Some(normalized)
}

/// Project a raw desired-path list onto the folders the registry should hold.
///
/// Blank entries and entries that are not existing directories are dropped,
/// the rest are made absolute, case-insensitive duplicates are removed
/// (first occurrence wins), and at most `max_folders` survivors are kept in
/// input order.
pub fn normalize_desired<I, S>(desired: I, max_folders: usize) -> Vec<(String, PathBuf)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut survivors = Vec::new();

    for raw in desired {
        if survivors.len() >= max_folders {
            break;
        }
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            continue;
        }
        let Some(path) = absolute_folder(Path::new(raw)) else {
            log::debug!("Skipping folder {:?}: cannot resolve absolute path", raw);
            continue;
        };
        if !path.is_dir() {
            log::debug!("Skipping folder {}: not an existing directory", path.display());
            continue;
        }
        let key = folder_key(&path);
        if seen.insert(key.clone()) {
            survivors.push((key, path));
        }
    }

    survivors
}
