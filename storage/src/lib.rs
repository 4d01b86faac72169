//! Flat-file persistence for the prediction contest: five JSON documents,
//! one named lock per document, and repositories as the only writers.

use std::path::PathBuf;
use std::sync::Arc;

mod backup;
mod lock;
mod posts;
mod predictions;
mod reconcile;
mod results;
mod sessions;
mod store;
mod user_stats;


pub use backup::BackupService;
pub use lock::LockManager;
pub use posts::PostRepository;
pub use predictions::PredictionRepository;
pub use results::ResultRepository;
pub use sessions::SessionRepository;
pub use store::{JsonStore, StoreError, DOCUMENTS};
pub use user_stats::UserStatsRepository;

/// Handle to the whole data layer. All repositories share one store and one
/// lock manager, so cloning any of them keeps operating on the same files.
#[derive(Debug, Clone)]
pub struct Storage {
    pub posts: PostRepository,
    pub predictions: PredictionRepository,
    pub results: ResultRepository,
    pub user_stats: UserStatsRepository,
    pub sessions: SessionRepository,
    pub backups: BackupService,
    store: JsonStore,
}

impl Storage {
    /// Opens (or bootstraps) the data directory and wires up the
    /// repositories. `backup_dir` is only created when the first backup runs.
    pub async fn new(
        data_dir: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
    ) -> anyhow::Result<Self> {
        let store = JsonStore::new(data_dir).await?;
        let locks = Arc::new(LockManager::new());

        Ok(Self {
            posts: PostRepository::new(store.clone(), locks.clone()),
            predictions: PredictionRepository::new(store.clone(), locks.clone()),
            results: ResultRepository::new(store.clone(), locks.clone()),
            user_stats: UserStatsRepository::new(store.clone(), locks.clone()),
            sessions: SessionRepository::new(store.clone(), locks),
            backups: BackupService::new(store.clone(), backup_dir.into()),
            store,
        })
    }

    /// Direct access to the underlying document store, for callers that need
    /// paths or raw reads (diagnostics, admin exports).
    pub fn store(&self) -> &JsonStore {
        &self.store
    }
}
