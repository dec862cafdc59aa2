use tracing::info;

use crate::{
    config::Config,
    db::{Backend, FileBackend, PostgresBackend, SqliteBackend},
    utils::error::AppResult,
};

/// Picks the backend from configuration: an explicit data file wins, then a
/// Postgres URL, and otherwise the embedded SQLite database.
pub async fn init_backend(config: &Config) -> AppResult<Backend> {
    let backend = if let Some(path) = &config.data_file {
        info!("Using file backend at {}", path.display());
        Backend::File(FileBackend::new(path))
    } else if let Some(url) = &config.database_url {
        info!("Using postgres backend");
        Backend::Postgres(PostgresBackend::connect(url)?)
    } else {
        info!("Using sqlite backend at {}", config.sqlite_path.display());
        Backend::Sqlite(SqliteBackend::open(&config.sqlite_path))
    };

    Ok(backend)
}
