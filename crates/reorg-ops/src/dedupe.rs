//! Interactive duplicate removal.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use humansize::{BINARY, format_size};
use serde::{Deserialize, Serialize};

use reorg_analyze::{DuplicateGroup, DuplicateMember, DuplicateReport};
use reorg_core::ConfirmationProvider;

use crate::OperationError;

/// Outcome of resolving duplicate groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveSummary {
    /// Groups that were presented.
    pub groups_reviewed: usize,
    /// Files deleted.
    pub deleted: Vec<PathBuf>,
    /// Deletions the user declined.
    pub declined: usize,
    /// Bytes reclaimed by the deletions.
    pub bytes_freed: u64,
    /// Failed deletions.
    pub errors: Vec<OperationError>,
}

/// Walks the user through each duplicate group.
///
/// The first member of a group is always kept; every other member is offered
/// for deletion one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateResolver;

impl DuplicateResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Present every group and delete the members the user confirms.
    pub fn resolve(
        &self,
        report: &DuplicateReport,
        confirm: &mut dyn ConfirmationProvider,
    ) -> ResolveSummary {
        let mut summary = ResolveSummary::default();

        for group in &report.groups {
            summary.groups_reviewed += 1;
            confirm.show(&format_group(group));

            for member in group.deletion_candidates() {
                let question = format!("Delete duplicate '{}'?", member.relative.display());
                if !confirm.confirm(&question) {
                    summary.declined += 1;
                    continue;
                }

                match fs::remove_file(&member.path) {
                    Ok(()) => {
                        tracing::info!(path = %member.path.display(), "Deleted duplicate");
                        summary.deleted.push(member.path.clone());
                        summary.bytes_freed += group.size;
                    }
                    Err(e) => summary
                        .errors
                        .push(OperationError::io(&member.path, "Delete", e)),
                }
            }
        }

        summary
    }
}

/// Render a group as a block of lines: a header, then one line per member.
pub fn format_group(group: &DuplicateGroup) -> String {
    let mut out = format!(
        "Duplicate '{}' ({}, {} copies)",
        group.name,
        format_size(group.size, BINARY),
        group.count()
    );
    for (i, member) in group.members.iter().enumerate() {
        let marker = if i == 0 { "keep" } else { "    " };
        out.push_str(&format!("\n  {marker} {}", format_member(member, group.size)));
    }
    out
}

fn format_member(member: &DuplicateMember, size: u64) -> String {
    format!(
        "{}  {} bytes  {}",
        member.relative.display(),
        size,
        format_modified(member.modified)
    )
}

/// Format a modification time in local time.
pub fn format_modified(modified: Option<SystemTime>) -> String {
    match modified {
        Some(time) => DateTime::<Local>::from(time)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_group_lists_every_member() {
        let member = |p: &str| DuplicateMember {
            path: PathBuf::from("/data").join(p),
            relative: PathBuf::from(p),
            modified: None,
        };
        let group = DuplicateGroup {
            name: "notes.txt".to_string(),
            size: 1536,
            members: vec![member("a/notes.txt"), member("b/notes.txt")],
            content_hash: None,
            wasted_bytes: 1536,
        };

        let text = format_group(&group);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Duplicate 'notes.txt' ("));
        assert!(lines[0].ends_with("KiB, 2 copies)"));
        assert_eq!(lines[1], "  keep a/notes.txt  1536 bytes  unknown");
        assert_eq!(lines[2], "       b/notes.txt  1536 bytes  unknown");
    }

    #[test]
    fn test_format_modified() {
        let formatted = format_modified(Some(SystemTime::now()));
        assert_eq!(formatted.len(), "2025-01-01 00:00:00".len());
        assert_eq!(format_modified(None), "unknown");
    }
}
