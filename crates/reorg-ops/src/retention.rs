//! Retention cleanup.
//!
//! A due directory loses every direct child except preserved names. Its
//! stored timestamp is then updated, and when the directory is the root of a
//! repository with pending changes, the result is committed and pushed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use reorg_analyze::{ScheduledRecord, schedule};
use reorg_core::{
    RecordStore, Repository, RepositoryOpener, RetentionRecord, RetentionSettings, StoreError,
    VcsError,
};

use crate::OperationError;

/// Configuration for the retention cleaner.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct CleanConfig {
    /// Direct children with these names are never removed.
    #[builder(default = "vec![\".git\".to_string(), \".gitignore\".to_string()]")]
    pub preserved_names: Vec<String>,

    /// Commit message prefix; the cleanup time is appended.
    #[builder(default = "\"Auto commit\".to_string()")]
    pub commit_prefix: String,

    /// Push after committing.
    #[builder(default = "true")]
    pub push: bool,

    /// Report what would be removed without touching anything.
    #[builder(default = "false")]
    pub dry_run: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self::from(&RetentionSettings::default())
    }
}

impl From<&RetentionSettings> for CleanConfig {
    fn from(settings: &RetentionSettings) -> Self {
        Self {
            preserved_names: settings.preserved_names.clone(),
            commit_prefix: settings.commit_prefix.clone(),
            push: settings.push,
            dry_run: false,
        }
    }
}

impl CleanConfig {
    /// Create a new config builder.
    pub fn builder() -> CleanConfigBuilder {
        CleanConfigBuilder::default()
    }

    /// Commit message for a cleanup at `now`.
    pub fn commit_message(&self, now: NaiveDateTime) -> String {
        format!("{} {}", self.commit_prefix, now.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// What happened inside one directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanOutcome {
    /// The cleaned directory.
    pub path: PathBuf,
    /// Children removed (or that would be, in a dry run).
    pub removed: Vec<PathBuf>,
    /// Children kept because their name is preserved.
    pub preserved: Vec<PathBuf>,
    /// Children that could not be removed.
    pub errors: Vec<OperationError>,
}

/// Version control result after a cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VcsOutcome {
    /// Not the root of a repository.
    Unversioned,
    /// Repository had nothing to commit.
    Clean,
    /// Changes committed (and pushed when enabled).
    Committed { pushed: bool },
    /// A repository step failed; the cleanup itself stands.
    Failed { message: String },
}

/// Result for one tracked directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DirectoryOutcome {
    /// Threshold not yet exceeded; nothing touched.
    NotDue,
    /// Path does not exist; timestamp unchanged.
    Missing,
    /// Path exists but is not a directory; timestamp unchanged.
    NotADirectory,
    /// Directory could not be listed; timestamp unchanged.
    Unreadable { message: String },
    /// Directory cleaned.
    Cleaned {
        outcome: CleanOutcome,
        /// Whether the stored timestamp was updated.
        timestamp_updated: bool,
        vcs: VcsOutcome,
    },
}

/// A tracked directory with its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryReport {
    pub record: RetentionRecord,
    pub outcome: DirectoryOutcome,
}

/// Outcome of a retention run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionReport {
    /// Time the run used for due checks and timestamps.
    pub now: NaiveDateTime,
    /// One entry per tracked directory: due ones first, each group in store order.
    pub directories: Vec<DirectoryReport>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RetentionReport {
    /// Number of directories cleaned.
    pub fn cleaned_count(&self) -> usize {
        self.directories
            .iter()
            .filter(|d| matches!(d.outcome, DirectoryOutcome::Cleaned { .. }))
            .count()
    }

    /// Number of children removed across all directories.
    pub fn removed_count(&self) -> usize {
        self.cleaned().map(|o| o.removed.len()).sum()
    }

    /// Every per-entry error across all directories.
    pub fn errors(&self) -> impl Iterator<Item = &OperationError> {
        self.cleaned().flat_map(|o| o.errors.iter())
    }

    fn cleaned(&self) -> impl Iterator<Item = &CleanOutcome> {
        self.directories.iter().filter_map(|d| match &d.outcome {
            DirectoryOutcome::Cleaned { outcome, .. } => Some(outcome),
            _ => None,
        })
    }
}

/// Cleans tracked directories whose retention threshold has passed.
#[derive(Debug, Clone)]
pub struct RetentionCleaner {
    config: CleanConfig,
}

impl RetentionCleaner {
    /// Create a cleaner with the given config.
    pub fn new(config: CleanConfig) -> Self {
        Self { config }
    }

    /// Remove every direct child of `path` whose name is not preserved.
    ///
    /// One failing child does not stop the others. Fails only when `path`
    /// itself cannot be listed.
    pub fn clean_directory(&self, path: &Path) -> Result<CleanOutcome, OperationError> {
        self.clean_with(path, remove_entry)
    }

    fn clean_with<F>(&self, path: &Path, mut remove: F) -> Result<CleanOutcome, OperationError>
    where
        F: FnMut(&Path) -> std::io::Result<()>,
    {
        let mut outcome = CleanOutcome {
            path: path.to_path_buf(),
            ..Default::default()
        };

        let children =
            fs::read_dir(path).map_err(|e| OperationError::io(path, "Read directory", e))?;

        for child in children {
            let child = match child {
                Ok(child) => child,
                Err(e) => {
                    outcome.errors.push(OperationError::io(path, "Read entry", e));
                    continue;
                }
            };
            let child_path = child.path();
            let name = child.file_name().to_string_lossy().to_string();

            if self.config.preserved_names.contains(&name) {
                outcome.preserved.push(child_path);
                continue;
            }

            if self.config.dry_run {
                tracing::info!(path = %child_path.display(), "Would delete");
                outcome.removed.push(child_path);
                continue;
            }

            match remove(&child_path) {
                Ok(()) => {
                    tracing::debug!(path = %child_path.display(), "Deleted");
                    outcome.removed.push(child_path);
                }
                Err(e) => outcome.errors.push(OperationError::io(&child_path, "Delete", e)),
            }
        }

        outcome.removed.sort();
        outcome.preserved.sort();
        outcome.errors.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(outcome)
    }

    /// Clean every due directory tracked in `store`.
    ///
    /// Only a failure to read the records aborts the run. Each due directory
    /// is cleaned, then its timestamp is stored, then any repository at its
    /// root is committed and pushed.
    pub fn run(
        &self,
        store: &mut dyn RecordStore,
        repositories: &dyn RepositoryOpener,
        now: NaiveDateTime,
    ) -> Result<RetentionReport, StoreError> {
        let records = store.load_records()?;
        let schedule = schedule(records, now);
        tracing::info!(
            due = schedule.due.len(),
            tracked = schedule.len(),
            "Loaded retention records"
        );

        let mut directories = Vec::with_capacity(schedule.len());

        for ScheduledRecord { record, .. } in schedule.due {
            let outcome = self.process_due(&record, store, repositories, now);
            directories.push(DirectoryReport { record, outcome });
        }

        for ScheduledRecord { record, .. } in schedule.pending {
            tracing::debug!(directory = %record.directory, "Not due yet");
            directories.push(DirectoryReport {
                record,
                outcome: DirectoryOutcome::NotDue,
            });
        }

        Ok(RetentionReport {
            now,
            directories,
            dry_run: self.config.dry_run,
        })
    }

    fn process_due(
        &self,
        record: &RetentionRecord,
        store: &mut dyn RecordStore,
        repositories: &dyn RepositoryOpener,
        now: NaiveDateTime,
    ) -> DirectoryOutcome {
        let path = record.path();

        match fs::metadata(&path) {
            Err(_) => {
                tracing::warn!(path = %path.display(), "Tracked directory does not exist");
                return DirectoryOutcome::Missing;
            }
            Ok(meta) if !meta.is_dir() => {
                tracing::warn!(path = %path.display(), "Tracked path is not a directory");
                return DirectoryOutcome::NotADirectory;
            }
            Ok(_) => {}
        }

        let cleaned = self.clean_directory(&path);
        self.settle(record, &path, cleaned, store, repositories, now)
    }

    /// Store the timestamp and update the repository after a clean. A
    /// directory that could not be listed gets neither.
    fn settle(
        &self,
        record: &RetentionRecord,
        path: &Path,
        cleaned: Result<CleanOutcome, OperationError>,
        store: &mut dyn RecordStore,
        repositories: &dyn RepositoryOpener,
        now: NaiveDateTime,
    ) -> DirectoryOutcome {
        let outcome = match cleaned {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Tracked directory is unreadable");
                return DirectoryOutcome::Unreadable { message: e.message };
            }
        };
        tracing::info!(
            path = %path.display(),
            removed = outcome.removed.len(),
            errors = outcome.errors.len(),
            "Cleaned directory"
        );

        if self.config.dry_run {
            return DirectoryOutcome::Cleaned {
                outcome,
                timestamp_updated: false,
                vcs: VcsOutcome::Unversioned,
            };
        }

        let timestamp_updated = match store.record_cleanup(&record.directory, now) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(directory = %record.directory, "Cannot update timestamp: {e}");
                false
            }
        };

        let vcs = match repositories.open(path) {
            Some(repo) => self.commit(repo.as_ref(), path, now),
            None => VcsOutcome::Unversioned,
        };

        DirectoryOutcome::Cleaned {
            outcome,
            timestamp_updated,
            vcs,
        }
    }

    fn commit(&self, repo: &dyn Repository, path: &Path, now: NaiveDateTime) -> VcsOutcome {
        match self.try_commit(repo, now) {
            Ok(outcome) => {
                tracing::info!(path = %path.display(), ?outcome, "Repository updated");
                outcome
            }
            Err(e) => {
                tracing::error!("{e}");
                VcsOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    fn try_commit(&self, repo: &dyn Repository, now: NaiveDateTime) -> Result<VcsOutcome, VcsError> {
        if !repo.has_pending_changes()? {
            return Ok(VcsOutcome::Clean);
        }
        repo.commit_all(&self.config.commit_message(now))?;
        if self.config.push {
            repo.push()?;
        }
        Ok(VcsOutcome::Committed {
            pushed: self.config.push,
        })
    }
}

impl Default for RetentionCleaner {
    fn default() -> Self {
        Self::new(CleanConfig::default())
    }
}

/// Remove a file, link or directory tree. Links are removed, never followed.
fn remove_entry(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
