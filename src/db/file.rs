use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

use crate::{
    db::PersistenceBackend,
    models::Snapshot,
    utils::error::{AppError, AppResult},
};

/// Stores the snapshot as one JSON document.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) -> AppResult<()> {
        let failed = |e: std::io::Error| {
            AppError::StorageWriteFailed(format!("{}: {e}", self.path.display()))
        };

        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| AppError::StorageWriteFailed(e.to_string()))?;

        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).await.map_err(failed)?;
        file.write_all(&bytes).await.map_err(failed)?;
        file.sync_all().await.map_err(failed)?;
        drop(file);

        fs::rename(&tmp, &self.path).await.map_err(failed)?;
        debug!("Wrote snapshot to {}", self.path.display());
        Ok(())
    }
}

impl PersistenceBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> AppResult<Snapshot> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(e) => {
                return Err(AppError::StorageUnavailable(format!(
                    "{}: {e}",
                    self.path.display()
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(Snapshot::default());
        }

        serde_json::from_str(&raw).map_err(|e| {
            AppError::StorageUnavailable(format!("{} is malformed: {e}", self.path.display()))
        })
    }

    async fn is_initialized(&self) -> AppResult<bool> {
        fs::try_exists(&self.path).await.map_err(|e| {
            AppError::StorageUnavailable(format!("{}: {e}", self.path.display()))
        })
    }

    async fn save(&self, snapshot: &Snapshot) -> AppResult<()> {
        self.write_snapshot(snapshot).await
    }

    async fn migrate_from(&self, other: &Snapshot) -> AppResult<()> {
        let mut current = self
            .load()
            .await
            .map_err(|e| AppError::StorageWriteFailed(e.to_string()))?;
        current.absorb(other);
        self.write_snapshot(&current).await
    }
}
