//! Retention records and the capabilities the cleaner depends on.

use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, VcsError};

/// A directory whose contents are periodically deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRecord {
    /// Directory as stored; may start with `~`.
    pub directory: String,
    /// Maximum days between cleanups.
    pub max_age_days: i64,
    /// When the directory was last cleaned.
    pub last_operation: NaiveDateTime,
}

impl RetentionRecord {
    /// Create a new record.
    pub fn new(
        directory: impl Into<String>,
        max_age_days: i64,
        last_operation: NaiveDateTime,
    ) -> Self {
        Self {
            directory: directory.into(),
            max_age_days,
            last_operation,
        }
    }

    /// The retention threshold as a duration.
    pub fn threshold(&self) -> TimeDelta {
        TimeDelta::try_days(self.max_age_days).unwrap_or(TimeDelta::MAX)
    }

    /// Time since the last cleanup.
    pub fn elapsed(&self, now: NaiveDateTime) -> TimeDelta {
        now - self.last_operation
    }

    /// Whether the directory must be cleaned at `now`.
    ///
    /// Due only when strictly more than the threshold has elapsed.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.elapsed(now) > self.threshold()
    }

    /// The directory with a leading `~` expanded.
    pub fn path(&self) -> PathBuf {
        expand_home(&self.directory)
    }
}

/// Expand a leading `~` or `~/` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

/// Persistent storage for retention records.
///
/// A store owns its connection; dropping the store releases it.
pub trait RecordStore {
    /// Read every tracked record.
    fn load_records(&mut self) -> Result<Vec<RetentionRecord>, StoreError>;

    /// Set `last_operation` for a directory.
    fn record_cleanup(&mut self, directory: &str, at: NaiveDateTime) -> Result<(), StoreError>;

    /// Insert or replace a record.
    fn track(&mut self, record: &RetentionRecord) -> Result<(), StoreError>;

    /// Remove a record. Returns false when it was not tracked.
    fn untrack(&mut self, directory: &str) -> Result<bool, StoreError>;
}

/// A version-controlled working tree.
pub trait Repository {
    /// Whether the working tree has uncommitted or untracked changes.
    fn has_pending_changes(&self) -> Result<bool, VcsError>;

    /// Stage every change (including deletions) and commit.
    fn commit_all(&self, message: &str) -> Result<(), VcsError>;

    /// Push the current branch to its remote.
    fn push(&self) -> Result<(), VcsError>;
}

/// Finds the repository rooted at a directory, if any.
pub trait RepositoryOpener {
    /// Open the working tree whose root is `dir`.
    fn open(&self, dir: &Path) -> Option<Box<dyn Repository>>;
}

/// Treats every directory as unversioned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepositories;

impl RepositoryOpener for NoRepositories {
    fn open(&self, _dir: &Path) -> Option<Box<dyn Repository>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_is_due_is_strict() {
        let record = RetentionRecord::new("/tmp/x", 7, at(1, 12));
        assert!(!record.is_due(at(8, 11)));
        assert!(!record.is_due(at(8, 12)));
        assert!(record.is_due(at(8, 13)));
    }

    #[test]
    fn test_zero_day_threshold() {
        let record = RetentionRecord::new("/tmp/x", 0, at(1, 12));
        assert!(!record.is_due(at(1, 12)));
        assert!(record.is_due(at(1, 13)));
    }

    #[test]
    fn test_huge_threshold_never_due() {
        let record = RetentionRecord::new("/tmp/x", i64::MAX, at(1, 12));
        assert!(!record.is_due(at(31, 12)));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("~user/x"), PathBuf::from("~user/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/Documents/tmp"), home.join("Documents/tmp"));
        }
    }

    #[test]
    fn test_no_repositories() {
        assert!(NoRepositories.open(Path::new("/tmp")).is_none());
    }
}
