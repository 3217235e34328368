//! JWalk-based directory walker.

use std::path::Path;
use std::time::Instant;

use jwalk::{Parallelism, WalkDir};

use reorg_core::{EntryKind, FileStat, WalkConfig, WalkEntry, WalkError, WalkTree, WalkWarning, WarningKind};

/// Walks a directory tree into a sorted, flat listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalker;

impl TreeWalker {
    /// Create a new walker.
    pub fn new() -> Self {
        Self
    }

    /// Walk the tree described by `config`.
    ///
    /// Fails only when the root itself is unusable. Unreadable directories
    /// and entries whose metadata cannot be read are reported as warnings
    /// and left out of the result.
    pub fn walk(&self, config: &WalkConfig) -> Result<WalkTree, WalkError> {
        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| WalkError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(WalkError::NotADirectory { path: root_path });
        }

        let mut warnings = Vec::new();
        let entries = self.collect_entries(config, &root_path, &mut warnings);

        tracing::debug!(
            root = %root_path.display(),
            entries = entries.len(),
            warnings = warnings.len(),
            "Walk finished"
        );

        Ok(WalkTree::new(root_path, entries, start.elapsed(), warnings))
    }

    /// Collect all entries using jwalk, in sorted depth-first order.
    fn collect_entries(
        &self,
        config: &WalkConfig,
        root_path: &Path,
        warnings: &mut Vec<WalkWarning>,
    ) -> Vec<WalkEntry> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            1 => Parallelism::Serial,
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(!config.include_hidden)
            .follow_links(config.follow_symlinks)
            .sort(true)
            .min_depth(1)
            .max_depth(config.max_depth.unwrap_or(usize::MAX));

        let mut entries = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let err = std::io::Error::from(err);
                    warnings.push(WalkWarning::read_error(path, &err));
                    continue;
                }
            };

            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = entry.file_type();

            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            // Resolve links so size and kind describe the target.
            let stat = match std::fs::metadata(&path) {
                Ok(metadata) => Some(FileStat::from_metadata(&metadata)),
                Err(err) if kind == EntryKind::Symlink => {
                    tracing::trace!(path = %path.display(), "Broken symlink: {err}");
                    warnings.push(WalkWarning::broken_symlink(&path));
                    None
                }
                Err(err) => {
                    warnings.push(WalkWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    None
                }
            };

            let relative = path
                .strip_prefix(root_path)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());

            entries.push(WalkEntry {
                depth: entry.depth(),
                path,
                relative,
                name,
                kind,
                stat,
            });
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();
        fs::create_dir(root.join(".hidden")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();
        fs::write(root.join(".hidden/secret.txt"), "shh").unwrap();

        temp
    }

    fn relatives(tree: &WalkTree) -> Vec<String> {
        tree.entries
            .iter()
            .map(|e| e.relative.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_basic_walk() {
        let temp = create_test_tree();
        let tree = TreeWalker::new().walk(&WalkConfig::new(temp.path())).unwrap();

        assert_eq!(tree.stats.total_files, 5);
        assert_eq!(tree.stats.total_dirs, 4);
        assert_eq!(tree.stats.max_depth, 3);
        assert!(tree.warnings.is_empty());
    }

    #[test]
    fn test_parents_precede_children() {
        let temp = create_test_tree();
        let tree = TreeWalker::new().walk(&WalkConfig::new(temp.path())).unwrap();
        let order = relatives(&tree);

        let pos = |name: &str| order.iter().position(|r| r == name).unwrap();
        assert!(pos("dir1") < pos("dir1/subdir"));
        assert!(pos("dir1/subdir") < pos("dir1/subdir/file3.txt"));
        assert!(pos("dir2") < pos("dir2/file4.txt"));
    }

    #[test]
    fn test_skip_hidden_prunes_subtree() {
        let temp = create_test_tree();
        let config = WalkConfig::new(temp.path()).with_hidden(false);
        let tree = TreeWalker::new().walk(&config).unwrap();
        let order = relatives(&tree);

        assert!(!order.iter().any(|r| r.starts_with(".hidden")));
        assert_eq!(tree.stats.total_files, 4);
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = TreeWalker::new()
            .walk(&WalkConfig::new(temp.path().join("missing")))
            .unwrap_err();
        assert!(matches!(err, WalkError::NotFound { .. }));
    }

    #[test]
    fn test_root_is_file() {
        let temp = create_test_tree();
        let err = TreeWalker::new()
            .walk(&WalkConfig::new(temp.path().join("file1.txt")))
            .unwrap_err();
        assert!(matches!(err, WalkError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_has_no_stat() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path().join("gone.txt"), temp.path().join("dangling"))
            .unwrap();

        let tree = TreeWalker::new().walk(&WalkConfig::new(temp.path())).unwrap();
        let dangling = tree.entries.iter().find(|e| e.name == "dangling").unwrap();

        assert_eq!(dangling.kind, EntryKind::Symlink);
        assert!(dangling.stat.is_none());
        assert!(!dangling.is_file_like());
        assert_eq!(tree.warnings.len(), 1);
        assert_eq!(tree.warnings[0].kind, WarningKind::BrokenSymlink);
    }
}
