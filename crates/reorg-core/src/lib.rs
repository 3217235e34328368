//! Core types and traits for reorg.
//!
//! This crate provides the data structures shared by the reorg utilities:
//! walked entries, configuration, error types, the confirmation capability
//! used before any destructive action, and the retention record model with
//! its store and repository seams.

mod config;
mod confirm;
mod error;
mod node;
mod retention;
mod tree;

pub use config::{
    DuplicateSettings, NormalizeSettings, ReorgConfig, RetentionSettings, StoreBackend,
    WalkConfig, WalkConfigBuilder,
};
pub use confirm::{AutoApprove, AutoDecline, ConfirmationProvider, InteractivePrompt};
pub use error::{ConfigError, StoreError, VcsError, WalkError, WalkWarning, WarningKind};
pub use node::{EntryKind, FileStat, WalkEntry};
pub use retention::{
    NoRepositories, RecordStore, Repository, RepositoryOpener, RetentionRecord, expand_home,
};
pub use tree::{WalkStats, WalkTree};
