//! Walk result container and statistics.

use std::cmp::Reverse;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WalkWarning;
use crate::node::{EntryKind, WalkEntry};

/// Summary statistics for a walk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkStats {
    /// Total number of files.
    pub total_files: u64,
    /// Total number of directories (excluding the root).
    pub total_dirs: u64,
    /// Total number of symbolic links.
    pub total_symlinks: u64,
    /// Total size of regular files in bytes.
    pub total_size: u64,
    /// Maximum depth reached.
    pub max_depth: usize,
}

impl WalkStats {
    /// Update stats with an entry.
    pub fn record(&mut self, entry: &WalkEntry) {
        self.max_depth = self.max_depth.max(entry.depth);
        match entry.kind {
            EntryKind::File => {
                self.total_files += 1;
                self.total_size += entry.size().unwrap_or(0);
            }
            EntryKind::Directory => self.total_dirs += 1,
            EntryKind::Symlink => self.total_symlinks += 1,
            EntryKind::Other => {}
        }
    }
}

/// The flat, ordered result of walking a directory tree.
///
/// Entries are in top-down order: a directory always precedes its contents,
/// and siblings are sorted by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkTree {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// Entries below the root (the root itself is not included).
    pub entries: Vec<WalkEntry>,
    /// Statistics gathered during the walk.
    pub stats: WalkStats,
    /// Time taken by the walk.
    pub duration: Duration,
    /// Non-fatal problems; the affected entries are not in `entries`.
    pub warnings: Vec<WalkWarning>,
}

impl WalkTree {
    /// Create a new walk result, computing stats from the entries.
    pub fn new(
        root: PathBuf,
        entries: Vec<WalkEntry>,
        duration: Duration,
        warnings: Vec<WalkWarning>,
    ) -> Self {
        let mut stats = WalkStats::default();
        for entry in &entries {
            stats.record(entry);
        }
        Self {
            root,
            entries,
            stats,
            duration,
            warnings,
        }
    }

    /// Entries whose content can be read as a file, in walk order.
    pub fn files(&self) -> impl Iterator<Item = &WalkEntry> {
        self.entries.iter().filter(|e| e.is_file_like())
    }

    /// Real directories (not links to directories), in walk order.
    pub fn directories(&self) -> impl Iterator<Item = &WalkEntry> {
        self.entries.iter().filter(|e| e.is_dir())
    }

    /// Entries ordered deepest first.
    ///
    /// Every entry comes after all of its descendants, so renaming or
    /// removing an entry never invalidates a path that is still to be
    /// visited. Order within one depth follows walk order.
    pub fn bottom_up(&self) -> Vec<&WalkEntry> {
        let mut entries: Vec<&WalkEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| Reverse(e.depth));
        entries
    }

    /// Check whether the walk found nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FileStat;

    fn entry(relative: &str, kind: EntryKind, size: u64) -> WalkEntry {
        let relative = PathBuf::from(relative);
        WalkEntry {
            path: PathBuf::from("/root").join(&relative),
            name: relative
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            depth: relative.components().count(),
            relative,
            kind,
            stat: Some(FileStat {
                size,
                modified: None,
                is_dir: kind == EntryKind::Directory,
            }),
        }
    }

    #[test]
    fn test_stats_from_entries() {
        let tree = WalkTree::new(
            PathBuf::from("/root"),
            vec![
                entry("a", EntryKind::Directory, 0),
                entry("a/one.txt", EntryKind::File, 10),
                entry("a/b", EntryKind::Directory, 0),
                entry("a/b/two.txt", EntryKind::File, 5),
                entry("link", EntryKind::Symlink, 10),
            ],
            Duration::ZERO,
            Vec::new(),
        );

        assert_eq!(tree.stats.total_files, 2);
        assert_eq!(tree.stats.total_dirs, 2);
        assert_eq!(tree.stats.total_symlinks, 1);
        assert_eq!(tree.stats.total_size, 15);
        assert_eq!(tree.stats.max_depth, 3);
        assert_eq!(tree.files().count(), 3);
        assert_eq!(tree.directories().count(), 2);
    }

    #[test]
    fn test_bottom_up_visits_children_first() {
        let tree = WalkTree::new(
            PathBuf::from("/root"),
            vec![
                entry("a", EntryKind::Directory, 0),
                entry("a/b", EntryKind::Directory, 0),
                entry("a/b/c.txt", EntryKind::File, 1),
                entry("d.txt", EntryKind::File, 1),
            ],
            Duration::ZERO,
            Vec::new(),
        );

        let order: Vec<String> = tree
            .bottom_up()
            .iter()
            .map(|e| e.relative.to_string_lossy().to_string())
            .collect();
        assert_eq!(order, vec!["a/b/c.txt", "a/b", "a", "d.txt"]);
    }
}
