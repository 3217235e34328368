//! SQLite record store.

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use reorg_core::{RecordStore, RetentionRecord, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS delete_directories (
    directory      TEXT PRIMARY KEY NOT NULL,
    max_age_days   INTEGER NOT NULL,
    last_operation TEXT NOT NULL
);";

/// Retention records in a local SQLite database.
///
/// The connection is closed when the store is dropped.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StoreError::backend)?;
        }
        let conn = Connection::open(path).map_err(StoreError::backend)?;
        debug!(path = %path.display(), "Opened SQLite record store");
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::backend)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA busy_timeout = 5000;")
            .map_err(StoreError::backend)?;
        conn.execute_batch(SCHEMA).map_err(StoreError::backend)?;
        Ok(Self { conn })
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Look up a single record.
    pub fn get(&self, directory: &str) -> Result<Option<RetentionRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT directory, max_age_days, last_operation
                 FROM delete_directories WHERE directory = ?1",
                params![directory],
                |row| Ok(RetentionRecord::new(row.get::<_, String>(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(StoreError::backend)
    }
}

impl RecordStore for SqliteStore {
    fn load_records(&mut self) -> Result<Vec<RetentionRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT directory, max_age_days, last_operation
                 FROM delete_directories ORDER BY rowid",
            )
            .map_err(StoreError::backend)?;

        let records = stmt
            .query_map([], |row| {
                Ok(RetentionRecord::new(
                    row.get::<_, String>(0)?,
                    row.get(1)?,
                    row.get(2)?,
                ))
            })
            .map_err(StoreError::backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::backend)?;

        debug!(count = records.len(), "Loaded retention records");
        Ok(records)
    }

    fn record_cleanup(&mut self, directory: &str, at: NaiveDateTime) -> Result<(), StoreError> {
        let updated = self
            .conn
            .execute(
                "UPDATE delete_directories SET last_operation = ?1 WHERE directory = ?2",
                params![at, directory],
            )
            .map_err(StoreError::backend)?;

        if updated == 0 {
            return Err(StoreError::NotTracked {
                directory: directory.to_string(),
            });
        }
        Ok(())
    }

    fn track(&mut self, record: &RetentionRecord) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO delete_directories (directory, max_age_days, last_operation)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(directory) DO UPDATE SET
                     max_age_days = excluded.max_age_days,
                     last_operation = excluded.last_operation",
                params![record.directory, record.max_age_days, record.last_operation],
            )
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn untrack(&mut self, directory: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM delete_directories WHERE directory = ?1",
                params![directory],
            )
            .map_err(StoreError::backend)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(10, 15, 30)
            .unwrap()
    }

    #[test]
    fn test_schema_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.connection().execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_track_replaces_existing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.track(&RetentionRecord::new("/tmp/a", 7, at(1))).unwrap();
        store.track(&RetentionRecord::new("/tmp/a", 14, at(2))).unwrap();

        let records = store.load_records().unwrap();
        assert_eq!(records, vec![RetentionRecord::new("/tmp/a", 14, at(2))]);
    }

    #[test]
    fn test_get() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.track(&RetentionRecord::new("~/tmp", 3, at(5))).unwrap();

        assert_eq!(store.get("~/tmp").unwrap().unwrap().max_age_days, 3);
        assert!(store.get("/elsewhere").unwrap().is_none());
    }
}
