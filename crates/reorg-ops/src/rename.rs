//! Name normalization on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use reorg_analyze::{NamePolicy, NormalizeConfig, RenameCandidate};
use reorg_core::{ConfirmationProvider, WalkTree};

use crate::OperationError;
use crate::conflict::detect_conflict;

/// A rename that was applied (or would be, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRename {
    /// Path before the rename.
    pub from: PathBuf,
    /// Path after the rename.
    pub to: PathBuf,
}

/// Outcome of a normalization run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameSummary {
    /// Renames applied, in the order they happened.
    pub renamed: Vec<AppliedRename>,
    /// Renames that a dry run would have considered.
    pub planned: Vec<AppliedRename>,
    /// Candidates the user declined.
    pub declined: usize,
    /// Entries that were already normalized or excluded.
    pub unchanged: usize,
    /// Failed renames.
    pub errors: Vec<OperationError>,
}

impl RenameSummary {
    /// Check if every attempted rename succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Rename one entry in place.
///
/// Fails without touching the disk when the new name is invalid or taken by
/// a different entry.
pub fn rename_entry(source: &Path, new_name: &str) -> Result<PathBuf, OperationError> {
    validate_filename(new_name).map_err(|e| OperationError::new(source, e))?;

    let parent = source.parent().unwrap_or(Path::new(""));
    let target = parent.join(new_name);

    if let Some(conflict) = detect_conflict(source, &target) {
        return Err(OperationError::new(
            source,
            format!("Cannot rename to '{new_name}': {}", conflict.kind),
        ));
    }

    fs::rename(source, &target).map_err(|e| OperationError::io(source, "Rename", e))?;
    Ok(target)
}

/// Validate a filename for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 characters)".into());
    }

    let invalid_chars = ['/', '\0'];
    for c in invalid_chars {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c));
        }
    }

    #[cfg(target_os = "windows")]
    {
        let windows_invalid = ['\\', ':', '*', '?', '"', '<', '>', '|'];
        for c in windows_invalid {
            if name.contains(c) {
                return Err(format!("Name cannot contain '{}'", c));
            }
        }

        let reserved = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        let upper_name = name.to_uppercase();
        let base_name = upper_name.split('.').next().unwrap_or("");
        if reserved.contains(&base_name) {
            return Err("Reserved filename".into());
        }

        if name.ends_with('.') || name.ends_with(' ') {
            return Err("Name cannot end with a dot or space".into());
        }
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}

/// Renames entries of a walked tree to their normalized names.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    policy: NamePolicy,
}

impl NameNormalizer {
    /// Create a normalizer from config.
    pub fn new(config: NormalizeConfig) -> Self {
        Self {
            policy: NamePolicy::new(config),
        }
    }

    /// Normalize every eligible entry, deepest first.
    ///
    /// Contents are renamed before their directory, so paths from the walk
    /// stay valid throughout.
    pub fn run(&self, tree: &WalkTree, confirm: &mut dyn ConfirmationProvider) -> RenameSummary {
        let dry_run = self.policy.config().dry_run;
        let mut summary = RenameSummary::default();

        for entry in tree.bottom_up() {
            let Some(candidate) = self.policy.candidate(entry) else {
                summary.unchanged += 1;
                continue;
            };

            if dry_run {
                tracing::info!(
                    path = %candidate.relative.display(),
                    "Would rename to '{}'",
                    candidate.proposed
                );
                summary.planned.push(AppliedRename {
                    to: candidate.target(),
                    from: candidate.path,
                });
                continue;
            }

            if !self.approve(&candidate, confirm) {
                tracing::debug!(path = %candidate.relative.display(), "Rename declined");
                summary.declined += 1;
                continue;
            }

            match rename_entry(&candidate.path, &candidate.proposed) {
                Ok(to) => {
                    tracing::info!(
                        "Renamed '{}' to '{}'",
                        candidate.relative.display(),
                        candidate.proposed
                    );
                    summary.renamed.push(AppliedRename {
                        from: candidate.path,
                        to,
                    });
                }
                Err(err) => {
                    tracing::warn!("{err}");
                    summary.errors.push(err);
                }
            }
        }

        summary
    }

    fn approve(&self, candidate: &RenameCandidate, confirm: &mut dyn ConfirmationProvider) -> bool {
        candidate.auto_approve
            || confirm.confirm(&format!(
                "Rename '{}' to '{}'?",
                candidate.relative.display(),
                candidate.proposed
            ))
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(NormalizeConfig::default())
    }
}
