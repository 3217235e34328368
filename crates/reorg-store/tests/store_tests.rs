use chrono::{NaiveDate, NaiveDateTime};
use reorg_core::{RecordStore, RetentionRecord, RetentionSettings, StoreBackend, StoreError};
use reorg_store::{SqliteStore, open_store};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

#[test]
fn test_records_survive_reopen() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("nested/retention.db");

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.track(&RetentionRecord::new("/srv/tmp", 7, at(1, 9))).unwrap();
        store.track(&RetentionRecord::new("~/Downloads", 30, at(2, 9))).unwrap();
    }

    let mut store = SqliteStore::open(&path).unwrap();
    let records = store.load_records().unwrap();

    assert_eq!(
        records,
        vec![
            RetentionRecord::new("/srv/tmp", 7, at(1, 9)),
            RetentionRecord::new("~/Downloads", 30, at(2, 9)),
        ]
    );
}

#[test]
fn test_record_cleanup_updates_timestamp() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.track(&RetentionRecord::new("/srv/tmp", 7, at(1, 9))).unwrap();

    store.record_cleanup("/srv/tmp", at(10, 17)).unwrap();

    assert_eq!(store.load_records().unwrap()[0].last_operation, at(10, 17));
}

#[test]
fn test_record_cleanup_unknown_directory() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let err = store.record_cleanup("/nowhere", at(1, 0)).unwrap_err();
    assert!(matches!(err, StoreError::NotTracked { .. }));
}

#[test]
fn test_untrack() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.track(&RetentionRecord::new("/srv/tmp", 7, at(1, 9))).unwrap();

    assert!(store.untrack("/srv/tmp").unwrap());
    assert!(!store.untrack("/srv/tmp").unwrap());
    assert!(store.load_records().unwrap().is_empty());
}

#[test]
fn test_open_store_sqlite() {
    let temp = tempfile::TempDir::new().unwrap();
    let settings = RetentionSettings {
        sqlite_path: Some(temp.path().join("records.db")),
        ..Default::default()
    };

    let mut store = open_store(&settings).unwrap();
    store.track(&RetentionRecord::new("/a", 1, at(1, 0))).unwrap();
    assert_eq!(store.load_records().unwrap().len(), 1);
    assert!(temp.path().join("records.db").exists());
}

#[cfg(not(feature = "postgres"))]
#[test]
fn test_postgres_unavailable_without_feature() {
    let settings = RetentionSettings {
        backend: StoreBackend::Postgres,
        ..Default::default()
    };
    let err = open_store(&settings).err().unwrap();
    assert!(matches!(err, StoreError::Unavailable { .. }));
}
