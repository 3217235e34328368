//! Directory walking for reorg.
//!
//! This crate turns a root directory into a flat, sorted [`WalkTree`] using
//! jwalk for traversal. Every utility walks first and decides later, so the
//! listing is fixed before anything on disk changes.
//!
//! # Example
//!
//! ```rust,no_run
//! use reorg_scan::{TreeWalker, WalkConfig};
//!
//! let config = WalkConfig::new("/path/to/walk");
//! let tree = TreeWalker::new().walk(&config).unwrap();
//!
//! println!("{} files, {} directories", tree.stats.total_files, tree.stats.total_dirs);
//! for entry in tree.bottom_up() {
//!     println!("{}", entry.relative.display());
//! }
//! ```

mod scanner;

pub use scanner::TreeWalker;

// Re-export core types for convenience
pub use reorg_core::{
    EntryKind, FileStat, WalkConfig, WalkEntry, WalkError, WalkStats, WalkTree, WalkWarning,
    WarningKind,
};
