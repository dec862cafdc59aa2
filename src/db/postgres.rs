use std::time::Duration;

use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Postgres, Transaction,
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
        id BIGINT PRIMARY KEY,
        question TEXT NOT NULL,
        yes_count BIGINT NOT NULL DEFAULT 0,
        no_count BIGINT NOT NULL DEFAULT 0,
        comments TEXT NOT NULL DEFAULT '[]',
        voters TEXT NOT NULL DEFAULT '{}'
    )",
    "CREATE TABLE IF NOT EXISTS whitelist (
        user_name TEXT PRIMARY KEY,
        seq BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pending_requests (
        user_name TEXT PRIMARY KEY,
        seq BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS meta (
        name TEXT PRIMARY KEY,
        value BIGINT NOT NULL
    )",
];

/// Networked Postgres store, same logical tables as [`super::SqliteBackend`].
pub struct PostgresBackend {
    pool: PgPool,
    schema: OnceCell<()>,
}

impl PostgresBackend {
    /// Builds a lazily connecting pool. Only a malformed URL fails here;
    /// an unreachable server fails the first load.
    pub fn connect(database_url: &str) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)
            .map_err(|e| AppError::InternalError(format!("Invalid DATABASE_URL: {e}")))?;

        Ok(Self {
            pool,
            schema: OnceCell::new(),
        })
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
    tx: &mut Transaction<'_, Postgres>,
    rows: &[PollRow],
    snapshot: &Snapshot,
) -> Result<(), sqlx::Error> {
    for row in rows {
        sqlx::query(
            "INSERT INTO polls (id, question, yes_count, no_count, comments, voters)
             VALUES ($1, $2, $3, $4, $5, $6)
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
            "SELECT COALESCE(MAX(seq) + 1, 0)::BIGINT FROM {table}"
        ))
        .fetch_one(&mut **tx)
        .await?;

        for (offset, user) in users.iter().enumerate() {
            sqlx::query(&format!(
                "INSERT INTO {table} (user_name, seq) VALUES ($1, $2)
                 ON CONFLICT (user_name) DO NOTHING"
            ))
            .bind(user)
            .bind(next + offset as i64)
            .execute(&mut **tx)
            .await?;
        }
    }

    sqlx::query(
        "INSERT INTO meta (name, value) VALUES ($1, $2)
         ON CONFLICT (name) DO UPDATE SET value = GREATEST(meta.value, EXCLUDED.value)",
    )
    .bind(COUNTER_KEY)
    .bind(snapshot.poll_id_counter as i64)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

impl PersistenceBackend for PostgresBackend {
    fn name(&self) -> &'static str {
        "postgres"
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

        let counter: Option<i64> = sqlx::query_scalar("SELECT value FROM meta WHERE name = $1")
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
        let counter: Option<i64> = sqlx::query_scalar("SELECT value FROM meta WHERE name = $1")
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

        let mut tx = self.pool.begin().await.map_err(write_failed)?;
        sqlx::query("TRUNCATE polls, whitelist, pending_requests, meta")
            .execute(&mut *tx)
            .await
            .map_err(write_failed)?;
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
            .collect::<AppResult<Vec<_>>>()?;

        let mut tx = self.pool.begin().await.map_err(write_failed)?;
        insert_snapshot(&mut tx, &rows, other)
            .await
            .map_err(write_failed)?;
        tx.commit().await.map_err(write_failed)
    }
}
