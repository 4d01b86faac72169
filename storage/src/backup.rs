use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::fs;
use tracing::info;

use crate::store::DOCUMENTS;
use crate::JsonStore;

/// Point-in-time copies of the live documents, one subdirectory per snapshot
/// named by a colon-free ISO timestamp.
#[derive(Debug, Clone)]
pub struct BackupService {
    store: JsonStore,
    root: PathBuf,
}

impl BackupService {
    pub(crate) fn new(store: JsonStore, root: PathBuf) -> Self {
        Self { store, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copies the five documents into a fresh snapshot directory and returns
    /// its path. Not locked against concurrent writers: a snapshot is
    /// best-effort, not a consistent cut.
    pub async fn create(&self) -> anyhow::Result<PathBuf> {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let dir = self.root.join(stamp);
        fs::create_dir_all(&dir).await?;

        for name in DOCUMENTS {
            fs::copy(self.store.path(name), dir.join(format!("{name}.json"))).await?;
        }

        info!(path = %dir.display(), "backup created");
        Ok(dir)
    }

    /// Copies every file of the snapshot back over the live documents,
    /// unconditionally.
    pub async fn restore(&self, snapshot: &Path) -> anyhow::Result<()> {
        let mut entries = fs::read_dir(snapshot).await?;
        while let Some(entry) = entries.next_entry().await? {
            fs::copy(entry.path(), self.store.dir().join(entry.file_name())).await?;
        }

        info!(path = %snapshot.display(), "restored from backup");
        Ok(())
    }

    /// Removes snapshot directories whose modification time is older than the
    /// cutoff; returns how many were deleted.
    pub async fn clean_old(&self, days_to_keep: u64) -> anyhow::Result<usize> {
        if !fs::try_exists(&self.root).await? {
            return Ok(0);
        }

        let cutoff = SystemTime::now() - Duration::from_secs(days_to_keep * 24 * 60 * 60);
        let mut deleted = 0;

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let modified = entry.metadata().await?.modified()?;
            if modified < cutoff {
                fs::remove_dir_all(entry.path()).await?;
                deleted += 1;
            }
        }

        info!(deleted, "old backups pruned");
        Ok(deleted)
    }
}
