//! Durable storage for the [`Snapshot`].
//!
//! Three interchangeable backends share one contract:
//!
//! | Backend | Medium | `save` atomicity |
//! |---------|--------|------------------|
//! | [`FileBackend`] | pretty JSON file | write `<path>.tmp`, then rename over the target |
//! | [`SqliteBackend`] | embedded SQLite database | single transaction |
//! | [`PostgresBackend`] | networked Postgres server | single transaction |
//!
//! Which one runs is decided once at startup by [`connection::init_backend`].
//! Everything above this module only sees [`PersistenceBackend`].

use std::future::Future;

use crate::{models::Snapshot, utils::error::AppResult};

pub mod connection;
pub mod file;
pub mod postgres;
mod rows;
pub mod sqlite;

pub use connection::init_backend;
pub use file::FileBackend;
pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;

pub trait PersistenceBackend: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Reads the full snapshot. A store that holds nothing yet yields
    /// [`Snapshot::default`]; a medium that cannot be reached yields
    /// `StorageUnavailable`.
    fn load(&self) -> impl Future<Output = AppResult<Snapshot>> + Send;

    /// Whether anything was ever written here. A store emptied by deletes is
    /// still initialized; only a never-written one may be migrated or seeded.
    fn is_initialized(&self) -> impl Future<Output = AppResult<bool>> + Send;

    /// Replaces the durable state with `snapshot`, all or nothing.
    fn save(&self, snapshot: &Snapshot) -> impl Future<Output = AppResult<()>> + Send;

    /// Bulk-inserts `other` without overwriting anything already stored.
    /// Running it twice with the same input is harmless.
    fn migrate_from(&self, other: &Snapshot) -> impl Future<Output = AppResult<()>> + Send;
}

pub enum Backend {
    File(FileBackend),
    Sqlite(SqliteBackend),
    Postgres(PostgresBackend),
}

impl Backend {
    pub fn is_relational(&self) -> bool {
        !matches!(self, Backend::File(_))
    }
}

impl PersistenceBackend for Backend {
    fn name(&self) -> &'static str {
        match self {
            Backend::File(b) => b.name(),
            Backend::Sqlite(b) => b.name(),
            Backend::Postgres(b) => b.name(),
        }
    }

    async fn load(&self) -> AppResult<Snapshot> {
        match self {
            Backend::File(b) => b.load().await,
            Backend::Sqlite(b) => b.load().await,
            Backend::Postgres(b) => b.load().await,
        }
    }

    async fn is_initialized(&self) -> AppResult<bool> {
        match self {
            Backend::File(b) => b.is_initialized().await,
            Backend::Sqlite(b) => b.is_initialized().await,
            Backend::Postgres(b) => b.is_initialized().await,
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> AppResult<()> {
        match self {
            Backend::File(b) => b.save(snapshot).await,
            Backend::Sqlite(b) => b.save(snapshot).await,
            Backend::Postgres(b) => b.save(snapshot).await,
        }
    }

    async fn migrate_from(&self, other: &Snapshot) -> AppResult<()> {
        match self {
            Backend::File(b) => b.migrate_from(other).await,
            Backend::Sqlite(b) => b.migrate_from(other).await,
            Backend::Postgres(b) => b.migrate_from(other).await,
        }
    }
}
