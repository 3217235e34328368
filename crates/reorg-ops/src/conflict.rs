//! Conflict detection for renames.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A conflict detected before a rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The path being renamed.
    pub source: PathBuf,
    /// The target path that is already taken.
    pub destination: PathBuf,
    /// The kind of conflict.
    pub kind: ConflictKind,
}

impl Conflict {
    /// Create a new conflict.
    pub fn new(source: PathBuf, destination: PathBuf, kind: ConflictKind) -> Self {
        Self {
            source,
            destination,
            kind,
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.destination.display())
    }
}

/// The kind of conflict encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// A file (or link) already exists at the destination.
    FileExists,
    /// A directory already exists at the destination.
    DirectoryExists,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileExists => write!(f, "File already exists"),
            Self::DirectoryExists => write!(f, "Directory already exists"),
        }
    }
}

/// Check whether renaming `source` to `destination` would clobber another entry.
///
/// A destination that resolves to the source itself (a case-only rename on a
/// case-insensitive filesystem) is not a conflict.
pub fn detect_conflict(source: &Path, destination: &Path) -> Option<Conflict> {
    let existing = fs::symlink_metadata(destination).ok()?;
    if is_same_entry(source, destination) {
        return None;
    }
    let kind = if existing.is_dir() {
        ConflictKind::DirectoryExists
    } else {
        ConflictKind::FileExists
    };
    Some(Conflict::new(
        source.to_path_buf(),
        destination.to_path_buf(),
        kind,
    ))
}

#[cfg(unix)]
fn is_same_entry(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_entry(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_conflict_when_free() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("A.txt"), "a").unwrap();
        assert!(detect_conflict(&temp.path().join("A.txt"), &temp.path().join("b.txt")).is_none());
    }

    #[test]
    fn test_file_conflict() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("My File.txt"), "a").unwrap();
        fs::write(temp.path().join("my_file.txt"), "b").unwrap();

        let conflict = detect_conflict(
            &temp.path().join("My File.txt"),
            &temp.path().join("my_file.txt"),
        )
        .unwrap();
        assert_eq!(conflict.kind, ConflictKind::FileExists);
    }

    #[test]
    fn test_directory_conflict() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("My Dir")).unwrap();
        fs::create_dir(temp.path().join("my_dir")).unwrap();

        let conflict =
            detect_conflict(&temp.path().join("My Dir"), &temp.path().join("my_dir")).unwrap();
        assert_eq!(conflict.kind, ConflictKind::DirectoryExists);
    }

    #[test]
    fn test_same_entry_is_not_conflict() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("same.txt");
        fs::write(&path, "a").unwrap();
        assert!(detect_conflict(&path, &path).is_none());
    }
}
