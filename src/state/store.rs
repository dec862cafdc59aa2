//! The in-memory authoritative [`Snapshot`] and its write-through to a
//! [`PersistenceBackend`].
//!
//! One `tokio::sync::Mutex` covers read-modify-persist as a single critical
//! section, so mutations never interleave even on a multi-threaded runtime.

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    config::Durability,
    db::{FileBackend, PersistenceBackend},
    models::Snapshot,
    utils::error::{AppError, AppResult},
};

/// Result of a successful mutation. `warning` carries the write error when
/// the change is only held in memory.
#[derive(Debug)]
pub struct Mutation<T> {
    pub value: T,
    pub warning: Option<AppError>,
}

impl<T> Mutation<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone)]
pub struct HydrateOptions {
    /// Older flat-file snapshot migrated in when the backend starts empty.
    pub legacy: Option<FileBackend>,
    /// Whitelist for a store that holds nothing at all.
    pub seed_whitelist: Vec<String>,
    pub durability: Durability,
}

impl Default for HydrateOptions {
    fn default() -> Self {
        Self {
            legacy: None,
            seed_whitelist: Vec::new(),
            durability: Durability::BestEffort,
        }
    }
}

pub struct StateStore<B> {
    backend: B,
    snapshot: Mutex<Snapshot>,
    durability: Durability,
}

impl<B: PersistenceBackend> StateStore<B> {
    pub fn new(backend: B, snapshot: Snapshot, durability: Durability) -> Self {
        Self {
            backend,
            snapshot: Mutex::new(snapshot),
            durability,
        }
    }

    /// Loads the backend once at process start. An unreachable backend
    /// degrades to an empty default state instead of failing startup.
    ///
    /// Legacy migration and the seed whitelist only apply to a store that was
    /// never written. One emptied by deletes keeps its emptiness.
    pub async fn hydrate(backend: B, options: HydrateOptions) -> Self {
        let (mut snapshot, fresh) = match backend.load().await {
            Ok(snapshot) => {
                let fresh = match backend.is_initialized().await {
                    Ok(initialized) => !initialized,
                    Err(e) => {
                        warn!("Could not tell whether {} backend is initialized: {e}", backend.name());
                        false
                    }
                };
                match &options.legacy {
                    Some(legacy) if fresh => {
                        let migrated = migrate_legacy(&backend, legacy).await;
                        (migrated.unwrap_or(snapshot), fresh)
                    }
                    _ => (snapshot, fresh),
                }
            }
            Err(e) => {
                warn!("{} backend unavailable, starting from defaults: {e}", backend.name());
                (Snapshot::default(), true)
            }
        };

        if fresh && snapshot.is_empty() && !options.seed_whitelist.is_empty() {
            info!("Seeding whitelist with {} users", options.seed_whitelist.len());
            snapshot.whitelist = options.seed_whitelist.clone();
        }

        if snapshot.repair() {
            warn!("Loaded snapshot violated invariants and was repaired");
        }

        info!(
            "Hydrated from {} backend: {} polls, {} whitelisted, {} pending",
            backend.name(),
            snapshot.polls.len(),
            snapshot.whitelist.len(),
            snapshot.pending_requests.len()
        );

        Self::new(backend, snapshot, options.durability)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        let snapshot = self.snapshot.lock().await;
        f(&snapshot)
    }

    /// Applies `f` and persists the result before returning. An error from
    /// `f` leaves state untouched and nothing is written.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> AppResult<T>,
    ) -> AppResult<Mutation<T>> {
        let mut snapshot = self.snapshot.lock().await;
        let previous = match self.durability {
            Durability::Strict => Some(snapshot.clone()),
            Durability::BestEffort => None,
        };

        let value = match f(&mut snapshot) {
            Ok(value) => value,
            Err(e) => {
                if let Some(previous) = previous {
                    *snapshot = previous;
                }
                return Err(e);
            }
        };

        match self.backend.save(&snapshot).await {
            Ok(()) => Ok(Mutation {
                value,
                warning: None,
            }),
            Err(e) => match previous {
                Some(previous) => {
                    *snapshot = previous;
                    warn!("Persisting to {} failed, change rolled back: {e}", self.backend.name());
                    Err(e)
                }
                None => {
                    warn!("Persisting to {} failed, change kept in memory: {e}", self.backend.name());
                    Ok(Mutation {
                        value,
                        warning: Some(e),
                    })
                }
            },
        }
    }
}

async fn migrate_legacy<B: PersistenceBackend>(backend: &B, legacy: &FileBackend) -> Option<Snapshot> {
    let old = match legacy.load().await {
        Ok(old) if !old.is_empty() => old,
        Ok(_) => return None,
        Err(e) => {
            warn!("Skipping migration from {}: {e}", legacy.path().display());
            return None;
        }
    };

    if let Err(e) = backend.migrate_from(&old).await {
        warn!("Migration into {} failed, serving legacy data from memory: {e}", backend.name());
        return Some(old);
    }

    info!(
        "Migrated {} polls from {} into {} backend",
        old.polls.len(),
        legacy.path().display(),
        backend.name()
    );

    match backend.load().await {
        Ok(migrated) => Some(migrated),
        Err(e) => {
            warn!("Reloading after migration failed: {e}");
            Some(old)
        }
    }
}
