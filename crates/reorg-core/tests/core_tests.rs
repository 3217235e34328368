use reorg_core::{
    AutoApprove, AutoDecline, ConfirmationProvider, EntryKind, FileStat, InteractivePrompt,
    ReorgConfig, RetentionRecord, StoreBackend, WalkConfig, WalkEntry, WalkTree,
};
use std::io::Cursor;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

#[test]
fn test_config_file_round_trip_through_disk() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[normalize]
auto_approve_extensions = [".pdf"]
excluded_folders = ["Vault", "Archive"]

[retention]
preserved_names = [".git", ".gitignore", "README.md"]
sqlite_path = "/var/lib/reorg/records.db"
"#,
    )
    .unwrap();

    let config = ReorgConfig::load(Some(&path)).unwrap();

    assert_eq!(config.normalize.auto_approve_extensions, vec![".pdf"]);
    assert_eq!(config.normalize.excluded_folders, vec!["Vault", "Archive"]);
    assert_eq!(config.retention.preserved_names.len(), 3);
    assert_eq!(
        config.retention.database_path(),
        PathBuf::from("/var/lib/reorg/records.db")
    );
    assert_eq!(config.retention.backend, StoreBackend::Sqlite);
}

#[test]
fn test_walk_config_simple() {
    let config = WalkConfig::new("/data").with_hidden(false);
    assert_eq!(config.root, PathBuf::from("/data"));
    assert!(!config.include_hidden);
    assert!(config.max_depth.is_none());
}

#[test]
fn test_walk_tree_counts_entries() {
    let now = SystemTime::now();
    let tree = WalkTree::new(
        PathBuf::from("/data"),
        vec![WalkEntry {
            path: PathBuf::from("/data/report.pdf"),
            relative: PathBuf::from("report.pdf"),
            name: "report.pdf".to_string(),
            depth: 1,
            kind: EntryKind::File,
            stat: Some(FileStat {
                size: 42,
                modified: Some(now),
                is_dir: false,
            }),
        }],
        Duration::from_millis(5),
        Vec::new(),
    );

    assert_eq!(tree.stats.total_size, 42);
    assert_eq!(tree.files().count(), 1);
    assert_eq!(tree.files().next().unwrap().modified(), Some(now));
}

#[test]
fn test_providers_are_object_safe() {
    let mut providers: Vec<Box<dyn ConfirmationProvider>> = vec![
        Box::new(AutoApprove),
        Box::new(AutoDecline),
        Box::new(InteractivePrompt::new(Cursor::new("y\n"), Vec::new())),
    ];

    let answers: Vec<bool> = providers
        .iter_mut()
        .map(|p| p.confirm("Delete?"))
        .collect();
    assert_eq!(answers, vec![true, false, true]);
}

#[test]
fn test_retention_record_path_expansion() {
    let record = RetentionRecord::new(
        "/srv/tmp",
        3,
        chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    );
    assert_eq!(record.path(), PathBuf::from("/srv/tmp"));
    assert_eq!(record.threshold(), chrono::TimeDelta::days(3));
}
