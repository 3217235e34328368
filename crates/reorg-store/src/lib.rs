//! Retention record stores for reorg.
//!
//! SQLite is always available and is the default. The Postgres backend is
//! compiled in with the `postgres` feature.

#[cfg(feature = "postgres")]
mod postgres;
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::{PgSettings, PgStore};
pub use sqlite::SqliteStore;

use reorg_core::{RecordStore, RetentionSettings, StoreBackend, StoreError};

/// Open the store selected by `settings`.
pub fn open_store(settings: &RetentionSettings) -> Result<Box<dyn RecordStore>, StoreError> {
    match settings.backend {
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(&settings.database_path())?)),
        StoreBackend::Postgres => open_postgres(),
    }
}

#[cfg(feature = "postgres")]
fn open_postgres() -> Result<Box<dyn RecordStore>, StoreError> {
    let settings = PgSettings::from_env()?;
    Ok(Box::new(PgStore::connect(&settings)?))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres() -> Result<Box<dyn RecordStore>, StoreError> {
    Err(StoreError::Unavailable {
        backend: StoreBackend::Postgres.to_string(),
    })
}
