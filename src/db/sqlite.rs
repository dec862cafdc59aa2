use std::path::Path;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    Sqlite, Transaction,
};
use tokio::sync::OnceCell;

use crate::{
    db::{
        rows::{unavailable, write_failed, PollRow, COUNTER_KEY},
        PersistenceBackend,
    },
    models::Snapshot,
    utils::error::{AppError, AppResult},
};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS polls (
        id INTEGER PRIMARY KEY,
        question TEXT NOT NULL,
        yes_count INTEGER NOT NULL DEFAULT 0,
        no_count INTEGER NOT NULL DEFAULT 0,
        comments TEXT NOT NULL DEFAULT '[]',
        voters TEXT NOT NULL DEFAULT '{}'
    )",
    "CREATE TABLE IF NOT EXISTS whitelist (
        user_name TEXT PRIMARY KEY,
        seq INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pending_requests (
        user_name TEXT PRIMARY KEY,
        seq INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS meta (
        name TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    )",
];

/// Embedded SQLite store. The pool connects lazily, so a bad path surfaces
/// as `StorageUnavailable` on the first load instead of at construction.
pub struct SqliteBackend {
    pool: SqlitePool,
    schema: OnceCell<()>,
}

impl SqliteBackend {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_lazy_with(options);

        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        self.schema
            .get_or_try_init(|| async {
                for statement in SCHEMA {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                Ok::<_, sqlx::Error>(())
            })
            .await?;
        Ok(())
    }
}

async fn insert_snapshot(
    tx: &mut Transaction<'_, Sqlite>,
    rows: &[PollRow],
    snapshot: &Snapshot,
) -> Result<(), sqlx::Error> {
    for row in rows {
        sqlx::query(
            "INSERT INTO polls (id, question, yes_count, no_count, comments, voters)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(row.id)
        .bind(&row.question)
        .bind(row.yes_count)
        .bind(row.no_count)
        .bind(&row.comments)
        .bind(&row.voters)
        .execute(&mut **tx)
        .await?;
    }

    for (table, users) in [
        ("whitelist", &snapshot.whitelist),
        ("pending_requests", &snapshot.pending_requests),
    ] {
        let next: i64 = sqlx::query_scalar(&format!(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM {table}"
        ))
        .fetch_one(&mut **tx)
        .await?;

        for (offset, user) in users.iter().enumerate() {
            sqlx::query(&format!(
                "INSERT INTO {table} (user_name, seq) VALUES (?, ?)
                 ON CONFLICT (user_name) DO NOTHING"
            ))
            .bind(user)
            .bind(next + offset as i64)
            .execute(&mut **tx)
            .await?;
        }
    }

    sqlx::query(
        "INSERT INTO meta (name, value) VALUES (?, ?)
         ON CONFLICT (name) DO UPDATE SET value = MAX(meta.value, excluded.value)",
    )
    .bind(COUNTER_KEY)
    .bind(snapshot.poll_id_counter as i64)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

impl PersistenceBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn load(&self) -> AppResult<Snapshot> {
        self.ensure_schema().await.map_err(unavailable)?;

        let polls = sqlx::query_as::<_, PollRow>(
            "SELECT id, question, yes_count, no_count, comments, voters FROM polls ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?
        .into_iter()
        .map(PollRow::into_poll)
        .collect::<AppResult<Vec<_>>>()?;

        let whitelist: Vec<String> =
            sqlx::query_scalar("SELECT user_name FROM whitelist ORDER BY seq")
                .fetch_all(&self.pool)
                .await
                .map_err(unavailable)?;

        let pending_requests: Vec<String> =
            sqlx::query_scalar("SELECT user_name FROM pending_requests ORDER BY seq")
                .fetch_all(&self.pool)
                .await
                .map_err(unavailable)?;

        let counter: Option<i64> = sqlx::query_scalar("SELECT value FROM meta WHERE name = ?")
            .bind(COUNTER_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(Snapshot {
            polls,
            whitelist,
            pending_requests,
            poll_id_counter: counter.map_or(1, |c| c.max(1) as u64),
        })
    }

    async fn is_initialized(&self) -> AppResult<bool> {
        self.ensure_schema().await.map_err(unavailable)?;
        // Every save and migration writes the counter row.
        let counter: Option<i64> = sqlx::query_scalar("SELECT value FROM meta WHERE name = ?")
            .bind(COUNTER_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(counter.is_some())
    }

    async fn save(&self, snapshot: &Snapshot) -> AppResult<()> {
        self.ensure_schema().await.map_err(write_failed)?;
        let rows = snapshot
            .polls
            .iter()
            .map(PollRow::from_poll)
            .collect::<AppResult<Vec<_>>>()?;

        // Dropping `tx` on any early return rolls the whole save back.
        let mut tx = self.pool.begin().await.map_err(write_failed)?;
        for table in ["polls", "whitelist", "pending_requests", "meta"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await
                .map_err(write_failed)?;
        }
        insert_snapshot(&mut tx, &rows, snapshot)
            .await
            .map_err(write_failed)?;
        tx.commit().await.map_err(write_failed)
    }

    async fn migrate_from(&self, other: &Snapshot) -> AppResult<()> {
        self.ensure_schema().await.map_err(write_failed)?;
        let rows = other
            .polls
            .iter()
            .map(PollRow::from_poll)
            .collect::<Result<Vec<_>, AppError>>()?;

        let mut tx = self.pool.begin().await.map_err(write_failed)?;
        insert_snapshot(&mut tx, &rows, other)
            .await
            .map_err(write_failed)?;
        tx.commit().await.map_err(write_failed)
    }
}
