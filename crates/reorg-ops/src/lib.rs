//! Destructive operations for reorg.
//!
//! Everything here changes the filesystem, and only after a
//! [`ConfirmationProvider`](reorg_core::ConfirmationProvider) or an explicit
//! approval rule allows it. Failures on single entries are collected into
//! the returned summaries and never stop the remaining work.

mod conflict;
mod dedupe;
#[cfg(feature = "git")]
mod git;
mod operation;
mod prune;
mod rename;
mod retention;

pub use conflict::{Conflict, ConflictKind, detect_conflict};
pub use dedupe::{DuplicateResolver, ResolveSummary, format_group, format_modified};
#[cfg(feature = "git")]
pub use git::{GitOpener, GitRepository};
pub use operation::OperationError;
pub use prune::{PruneSummary, prune_empty_dirs};
pub use rename::{AppliedRename, NameNormalizer, RenameSummary, rename_entry, validate_filename};
pub use retention::{
    CleanConfig, CleanConfigBuilder, CleanOutcome, DirectoryOutcome, DirectoryReport,
    RetentionCleaner, RetentionReport, VcsOutcome,
};
