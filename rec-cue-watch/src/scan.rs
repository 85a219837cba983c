//! Poll-scan snapshots and the baseline they are compared against.

use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

/// Reference point a watcher compares poll scans against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    /// Anything modified strictly after this counts as activity.
    pub time: SystemTime,
    /// File count seen by the last scan that advanced the baseline.
    pub file_count: usize,
}

impl Baseline {
    /// Baseline for a freshly (re)started watch: now, zero files.
    pub fn fresh() -> Self {
        Self {
            time: SystemTime::now(),
            file_count: 0,
        }
    }
}

/// Result of one recursive scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderSnapshot {
    pub file_count: usize,
    /// Newest modification time among the files whose metadata could be read.
    pub newest_modification: Option<SystemTime>,
}

impl FolderSnapshot {
    /// True if the file count changed or any file is newer than the baseline.
    pub fn shows_activity_since(&self, baseline: &Baseline) -> bool {
        self.file_count != baseline.file_count
            || self
                .newest_modification
                .is_some_and(|newest| newest > baseline.time)
    }

    /// Baseline to adopt after this scan was judged active.
    ///
    /// Never moves backwards when a file carries a timestamp from the future.
    pub fn advance(&self, now: SystemTime) -> Baseline {
        let time = match self.newest_modification {
            Some(newest) if newest > now => newest,
            _ => now,
        };
        Baseline {
            time,
            file_count: self.file_count,
        }
    }
}

/// Enumerate every file under `root` recursively.
///
/// Returns `None` if `root` is not a directory (before or after the walk).
/// Entries that vanish or can't be stat'ed mid-walk are skipped.
pub fn scan_folder(root: &Path) -> Option<FolderSnapshot> {
    if !root.is_dir() {
        return None;
    }

    let mut file_count = 0usize;
    let mut newest_modification: Option<SystemTime> = None;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::trace!("Poll scan skipped entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        file_count += 1;

        match entry.metadata().map(|m| m.modified()) {
            Ok(Ok(modified)) => {
                if newest_modification.is_none_or(|newest| modified > newest) {
                    newest_modification = Some(modified);
                }
            }
            Ok(Err(e)) => log::trace!("No mtime for {}: {}", entry.path().display(), e),
            Err(e) => log::trace!("File vanished during scan {}: {}", entry.path().display(), e),
        }
    }

    if !root.is_dir() {
        return None;
    }

    Some(FolderSnapshot {
        file_count,
        newest_modification,
    })
}
