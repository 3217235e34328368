//! Postgres record store over diesel.
//!
//! Expects an existing `delete_directories` table with a unique `directory`
//! column. Connection settings come from `DB_NAME`, `DB_USER`, `DB_PASS`,
//! `DB_HOST` and `DB_PORT`.

use std::env;

use chrono::NaiveDateTime;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text, Timestamp};
use tracing::debug;

use reorg_core::{RecordStore, RetentionRecord, StoreError};

/// Connection settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgSettings {
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub host: String,
    pub port: Option<String>,
}

impl PgSettings {
    /// Read settings from `DB_*` variables. Password and port are optional.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or(StoreError::MissingEnv { var })
        };
        Ok(Self {
            dbname: required("DB_NAME")?,
            user: required("DB_USER")?,
            host: required("DB_HOST")?,
            password: lookup("DB_PASS"),
            port: lookup("DB_PORT").filter(|v| !v.is_empty()),
        })
    }

    /// A libpq keyword/value connection string.
    pub fn conninfo(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote(&self.host)),
            format!("dbname={}", quote(&self.dbname)),
            format!("user={}", quote(&self.user)),
        ];
        if let Some(port) = &self.port {
            parts.push(format!("port={}", quote(port)));
        }
        if let Some(password) = &self.password {
            parts.push(format!("password={}", quote(password)));
        }
        parts.join(" ")
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[derive(QueryableByName)]
struct RecordRow {
    #[diesel(sql_type = Text)]
    directory: String,
    #[diesel(sql_type = BigInt)]
    max_age_days: i64,
    #[diesel(sql_type = Timestamp)]
    last_operation: NaiveDateTime,
}

/// Retention records in a Postgres database.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    /// Connect with the given settings.
    pub fn connect(settings: &PgSettings) -> Result<Self, StoreError> {
        let conn = PgConnection::establish(&settings.conninfo()).map_err(StoreError::backend)?;
        debug!(host = %settings.host, dbname = %settings.dbname, "Connected to Postgres record store");
        Ok(Self { conn })
    }
}

impl RecordStore for PgStore {
    fn load_records(&mut self) -> Result<Vec<RetentionRecord>, StoreError> {
        let rows: Vec<RecordRow> = diesel::sql_query(
            "SELECT directory, max_age_days::bigint AS max_age_days,
                    last_operation::timestamp AS last_operation
             FROM delete_directories",
        )
        .load(&mut self.conn)
        .map_err(StoreError::backend)?;

        Ok(rows
            .into_iter()
            .map(|r| RetentionRecord::new(r.directory, r.max_age_days, r.last_operation))
            .collect())
    }

    fn record_cleanup(&mut self, directory: &str, at: NaiveDateTime) -> Result<(), StoreError> {
        let updated = diesel::sql_query(
            "UPDATE delete_directories SET last_operation = $1 WHERE directory = $2",
        )
        .bind::<Timestamp, _>(at)
        .bind::<Text, _>(directory)
        .execute(&mut self.conn)
        .map_err(StoreError::backend)?;

        if updated == 0 {
            return Err(StoreError::NotTracked {
                directory: directory.to_string(),
            });
        }
        Ok(())
    }

    fn track(&mut self, record: &RetentionRecord) -> Result<(), StoreError> {
        diesel::sql_query(
            "INSERT INTO delete_directories (directory, max_age_days, last_operation)
             VALUES ($1, $2, $3)
             ON CONFLICT (directory) DO UPDATE SET
                 max_age_days = EXCLUDED.max_age_days,
                 last_operation = EXCLUDED.last_operation",
        )
        .bind::<Text, _>(record.directory.as_str())
        .bind::<BigInt, _>(record.max_age_days)
        .bind::<Timestamp, _>(record.last_operation)
        .execute(&mut self.conn)
        .map_err(StoreError::backend)?;
        Ok(())
    }

    fn untrack(&mut self, directory: &str) -> Result<bool, StoreError> {
        let removed = diesel::sql_query("DELETE FROM delete_directories WHERE directory = $1")
            .bind::<Text, _>(directory)
            .execute(&mut self.conn)
            .map_err(StoreError::backend)?;
        Ok(removed > 0)
    }
}
