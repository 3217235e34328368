//! Duplicate file detection by name and size.
//!
//! Files are grouped by (base name, byte size). No content is read unless
//! `verify_content` is set, in which case each group is split by BLAKE3
//! hash so that only byte-identical files stay together.
//!
//! Groups keep the order in which their first member was found, and members
//! keep walk order, so the first member of a group is simply the first one
//! the walk reached.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use derive_builder::Builder;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use reorg_core::{DuplicateSettings, WalkEntry, WalkTree};

use crate::naming::build_glob_set;

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Minimum file size to consider.
    #[builder(default = "0")]
    pub min_size: u64,

    /// Maximum file size to consider.
    #[builder(default = "u64::MAX")]
    pub max_size: u64,

    /// Compare names case-insensitively (`Report.TXT` matches `report.txt`).
    #[builder(default = "true")]
    pub ignore_name_case: bool,

    /// Split groups by content hash.
    #[builder(default = "false")]
    pub verify_content: bool,

    /// Glob patterns on file names to exclude.
    #[builder(default)]
    pub exclude_patterns: Vec<String>,

    /// Maximum number of groups to return (0 = unlimited).
    #[builder(default = "0")]
    pub max_groups: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_size: u64::MAX,
            ignore_name_case: true,
            verify_content: false,
            exclude_patterns: Vec::new(),
            max_groups: 0,
        }
    }
}

impl From<&DuplicateSettings> for DuplicateConfig {
    fn from(settings: &DuplicateSettings) -> Self {
        Self {
            min_size: settings.min_size,
            verify_content: settings.verify_content,
            ..Self::default()
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }
}

/// Identity used to group files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicateKey {
    /// File name, case-folded when names are compared case-insensitively.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// One file in a duplicate group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMember {
    /// Absolute path.
    pub path: PathBuf,
    /// Path relative to the walked root.
    pub relative: PathBuf,
    /// Last modification time, if known.
    pub modified: Option<SystemTime>,
}

impl DuplicateMember {
    fn from_entry(entry: &WalkEntry) -> Self {
        Self {
            path: entry.path.clone(),
            relative: entry.relative.clone(),
            modified: entry.modified(),
        }
    }
}

/// Files sharing a name and size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// File name as spelled by the first member.
    pub name: String,

    /// Size of each file in bytes.
    pub size: u64,

    /// Members in walk order. The first one is kept.
    pub members: Vec<DuplicateMember>,

    /// BLAKE3 hex digest shared by all members, when content was verified.
    pub content_hash: Option<String>,

    /// Wasted space: size * (count - 1).
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    fn new(name: String, size: u64, members: Vec<DuplicateMember>, content_hash: Option<String>) -> Self {
        let wasted_bytes = size * (members.len() as u64).saturating_sub(1);
        Self {
            name,
            size,
            members,
            content_hash,
            wasted_bytes,
        }
    }

    /// Get the number of files in the group.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// If keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// The member that is kept.
    pub fn keeper(&self) -> Option<&DuplicateMember> {
        self.members.first()
    }

    /// Members offered for deletion.
    pub fn deletion_candidates(&self) -> &[DuplicateMember] {
        self.members.get(1..).unwrap_or(&[])
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Root that was walked.
    pub root: PathBuf,

    /// Groups in discovery order.
    pub groups: Vec<DuplicateGroup>,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,

    /// Number of files analyzed.
    pub files_analyzed: u64,

    /// Number of files that have duplicates.
    pub files_with_duplicates: u64,

    /// Number of duplicate groups.
    pub group_count: usize,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Get total number of files across all groups.
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self {
            config: DuplicateConfig::default(),
        }
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Find duplicates in a walked tree.
    pub fn find_duplicates(&self, tree: &WalkTree) -> DuplicateReport {
        let excluded = build_glob_set(&self.config.exclude_patterns);

        // Broken links and unreadable entries carry no stat and are skipped here.
        let files: Vec<&WalkEntry> = tree
            .files()
            .filter(|e| !excluded.is_match(&e.name))
            .filter(|e| {
                e.size()
                    .is_some_and(|s| s >= self.config.min_size && s <= self.config.max_size)
            })
            .collect();

        let files_analyzed = files.len() as u64;

        let mut by_key: IndexMap<DuplicateKey, (String, Vec<DuplicateMember>)> = IndexMap::new();
        for entry in files {
            let key = self.key_for(entry);
            by_key
                .entry(key)
                .or_insert_with(|| (entry.name.clone(), Vec::new()))
                .1
                .push(DuplicateMember::from_entry(entry));
        }
        by_key.retain(|_, (_, members)| members.len() > 1);

        let mut groups: Vec<DuplicateGroup> = if self.config.verify_content {
            by_key
                .into_iter()
                .flat_map(|(key, (name, members))| split_by_content(name, key.size, members))
                .collect()
        } else {
            by_key
                .into_iter()
                .map(|(key, (name, members))| DuplicateGroup::new(name, key.size, members, None))
                .collect()
        };

        if self.config.max_groups > 0 && groups.len() > self.config.max_groups {
            groups.truncate(self.config.max_groups);
        }

        let total_wasted_space = groups.iter().map(|g| g.wasted_bytes).sum();
        let files_with_duplicates = groups.iter().map(|g| g.members.len() as u64).sum();
        let group_count = groups.len();

        tracing::debug!(files_analyzed, group_count, "Duplicate grouping finished");

        DuplicateReport {
            root: tree.root.clone(),
            groups,
            total_wasted_space,
            files_analyzed,
            files_with_duplicates,
            group_count,
        }
    }

    fn key_for(&self, entry: &WalkEntry) -> DuplicateKey {
        let name = if self.config.ignore_name_case {
            entry.name.to_lowercase()
        } else {
            entry.name.clone()
        };
        DuplicateKey {
            name,
            size: entry.size().unwrap_or(0),
        }
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Split one name/size group into byte-identical subgroups.
///
/// Files that cannot be read drop out of the group.
fn split_by_content(name: String, size: u64, members: Vec<DuplicateMember>) -> Vec<DuplicateGroup> {
    let hashes: Vec<Option<String>> = members
        .par_iter()
        .map(|m| compute_full_hash(&m.path))
        .collect();

    let mut by_hash: IndexMap<String, Vec<DuplicateMember>> = IndexMap::new();
    for (member, hash) in members.into_iter().zip(hashes) {
        match hash {
            Some(h) => by_hash.entry(h).or_default().push(member),
            None => tracing::debug!(path = %member.path.display(), "Cannot hash, skipping"),
        }
    }

    by_hash
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(hash, members)| DuplicateGroup::new(name.clone(), size, members, Some(hash)))
        .collect()
}

/// Compute the full BLAKE3 hash of a file as hex.
fn compute_full_hash(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(BufReader::new(file)).ok()?;
    Some(hasher.finalize().to_hex().to_string())
}
