//! Empty directory removal.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use reorg_core::WalkTree;

use crate::OperationError;

/// Outcome of an empty-directory pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PruneSummary {
    /// Directories removed, deepest first.
    pub removed: Vec<PathBuf>,
    /// Directories that were empty but could not be removed.
    pub errors: Vec<OperationError>,
}

/// Remove every directory of the walked tree that is empty now.
///
/// Directories are visited deepest first and checked on disk at that moment,
/// so a parent whose only children were just removed goes too. The root is
/// never removed, and hidden directories (and everything below them) are
/// left alone.
pub fn prune_empty_dirs(tree: &WalkTree) -> PruneSummary {
    let mut summary = PruneSummary::default();

    for entry in tree.bottom_up() {
        if !entry.is_dir() || is_hidden(&entry.relative) {
            continue;
        }

        match is_empty_dir(&entry.path) {
            Ok(true) => match fs::remove_dir(&entry.path) {
                Ok(()) => {
                    tracing::info!(path = %entry.path.display(), "Removed empty folder");
                    summary.removed.push(entry.path.clone());
                }
                Err(e) => summary
                    .errors
                    .push(OperationError::io(&entry.path, "Remove folder", e)),
            },
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(path = %entry.path.display(), "Cannot read folder: {e}");
            }
        }
    }

    summary
}

fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}
