//! Walked entry types.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Type of a walked entry, as seen without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Other file types (sockets, devices, etc.).
    Other,
}

/// Size and modification time of an entry, after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: Option<SystemTime>,
    /// Whether the (resolved) target is a directory.
    pub is_dir: bool,
}

impl FileStat {
    /// Build from filesystem metadata.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: metadata.modified().ok(),
            is_dir: metadata.is_dir(),
        }
    }
}

/// A single entry found while walking a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkEntry {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Path relative to the walk root.
    pub relative: PathBuf,
    /// File or directory name.
    pub name: String,
    /// Depth below the root (direct children are at depth 1).
    pub depth: usize,
    /// Entry kind, not following links.
    pub kind: EntryKind,
    /// Resolved metadata; `None` when the target could not be read.
    pub stat: Option<FileStat>,
}

impl WalkEntry {
    /// Check if this is a directory (links to directories are not).
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Check if this entry resolves to readable file content.
    ///
    /// Regular files and links to files qualify; links to directories and
    /// broken links do not.
    pub fn is_file_like(&self) -> bool {
        match self.kind {
            EntryKind::File | EntryKind::Symlink => self.stat.is_some_and(|s| !s.is_dir),
            _ => false,
        }
    }

    /// Size of the resolved target, if known.
    pub fn size(&self) -> Option<u64> {
        self.stat.map(|s| s.size)
    }

    /// Modification time of the resolved target, if known.
    pub fn modified(&self) -> Option<SystemTime> {
        self.stat.and_then(|s| s.modified)
    }

    /// Directory containing this entry.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Check whether any component of the relative path equals one of `names`.
    pub fn is_within_any(&self, names: &[String]) -> bool {
        self.relative.components().any(|c| {
            let component = c.as_os_str().to_string_lossy();
            names.iter().any(|n| *n == component)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(relative: &str, kind: EntryKind, stat: Option<FileStat>) -> WalkEntry {
        let relative = PathBuf::from(relative);
        WalkEntry {
            path: Path::new("/root").join(&relative),
            name: relative
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            depth: relative.components().count(),
            relative,
            kind,
            stat,
        }
    }

    fn file_stat(size: u64, is_dir: bool) -> Option<FileStat> {
        Some(FileStat {
            size,
            modified: None,
            is_dir,
        })
    }

    #[test]
    fn test_file_like() {
        assert!(entry("a.txt", EntryKind::File, file_stat(3, false)).is_file_like());
        assert!(entry("link", EntryKind::Symlink, file_stat(3, false)).is_file_like());
        assert!(!entry("dirlink", EntryKind::Symlink, file_stat(0, true)).is_file_like());
        assert!(!entry("broken", EntryKind::Symlink, None).is_file_like());
        assert!(!entry("dir", EntryKind::Directory, file_stat(0, true)).is_file_like());
    }

    #[test]
    fn test_is_within_any() {
        let e = entry("Vault/notes/a.md", EntryKind::File, file_stat(1, false));
        assert!(e.is_within_any(&["Vault".to_string()]));
        assert!(!e.is_within_any(&["Other".to_string()]));
        assert_eq!(e.parent(), Path::new("/root/Vault/notes"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EntryKind::Directory.to_string(), "directory");
        assert_eq!(EntryKind::Symlink.to_string(), "symlink");
    }
}
