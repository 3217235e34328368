//! Analysis for reorg.
//!
//! This crate decides *what* should happen to a walked tree without changing
//! anything on disk:
//!
//! - **Duplicate grouping** - files sharing a name and byte size
//! - **Name normalization** - lowercase, underscore-separated names
//! - **Retention scheduling** - which tracked directories are due
//!
//! # Duplicate Grouping
//!
//! Files are grouped by (name, size). Content is only read when
//! `verify_content` is enabled, in which case groups are split by BLAKE3
//! hash.
//!
//! ```rust,ignore
//! use reorg_analyze::DuplicateFinder;
//! use reorg_scan::{TreeWalker, WalkConfig};
//!
//! let tree = TreeWalker::new().walk(&WalkConfig::new("/path/to/walk")).unwrap();
//! let report = DuplicateFinder::new().find_duplicates(&tree);
//!
//! for group in &report.groups {
//!     println!("{} ({} copies)", group.name, group.count());
//! }
//! ```
//!
//! # Name Normalization
//!
//! ```rust,ignore
//! use reorg_analyze::normalize_name;
//!
//! assert_eq!(normalize_name("My Report.PDF"), "my_report.pdf");
//! assert_eq!(normalize_name("camelCaseName.txt"), "camel_case_name.txt");
//! ```

mod duplicates;
pub mod naming;
pub mod retention;

pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicateKey,
    DuplicateMember, DuplicateReport,
};
pub use naming::{
    NamePolicy, NormalizeConfig, NormalizeConfigBuilder, RenameCandidate, TechnicalNames,
    is_technical, normalize_name, normalize_stem, split_extension,
};
pub use retention::{RetentionSchedule, ScheduledRecord, format_age, schedule};

// Re-export core types
pub use reorg_core::{EntryKind, RetentionRecord, WalkEntry, WalkTree};
