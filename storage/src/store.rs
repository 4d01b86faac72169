use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info};

/// The five documents that make up the live data set. Backups copy exactly
/// these; the reconciliation journal is deliberately not among them.
pub const DOCUMENTS: [&str; 5] = ["posts", "predictions", "results", "user-stats", "sessions"];

#[derive(Debug, Error)]
pub enum StoreError {
    /// The file is present but not parsable. This is never folded into
    /// "no data yet": an absent file means bootstrap, a broken file means
    /// somebody has to look at it before history gets overwritten.
    #[error("document `{name}` is present but cannot be parsed")]
    Corrupt {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("document `{name}` i/o failure")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("document `{name}` cannot be serialized")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Whole-document JSON persistence. One file per document, pretty-printed,
/// replaced atomically on every write via a temp file in the same directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Opens the data directory, creating it and empty `{}` documents on
    /// first run so every later read has a file to land on.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { dir: dir.into() };
        fs::create_dir_all(&store.dir)
            .await
            .map_err(|source| StoreError::Io {
                name: store.dir.display().to_string(),
                source,
            })?;

        for name in DOCUMENTS {
            let path = store.path(name);
            let exists = fs::try_exists(&path).await.map_err(|source| StoreError::Io {
                name: name.to_owned(),
                source,
            })?;
            if !exists {
                store.write(name, &serde_json::Map::new()).await?;
                info!(document = name, "created empty document");
            }
        }

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Missing file reads as the empty default, so bootstrap is free.
    pub async fn read<T>(&self, name: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let bytes = match fs::read(self.path(name)).await {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(T::default())
            }
            Err(source) => {
                return Err(StoreError::Io {
                    name: name.to_owned(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| {
            error!(document = name, %source, "document is corrupt, refusing to treat as empty");
            StoreError::Corrupt {
                name: name.to_owned(),
                source,
            }
        })
    }

    /// Serializes the full document and replaces the file. Write-then-rename
    /// keeps a crash from ever leaving a truncated document behind.
    pub async fn write<T>(&self, name: &str, document: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let json =
            serde_json::to_vec_pretty(document).map_err(|source| StoreError::Serialize {
                name: name.to_owned(),
                source,
            })?;

        let io_err = |source| StoreError::Io {
            name: name.to_owned(),
            source,
        };

        let tmp = self.dir.join(format!("{name}.json.tmp"));
        fs::write(&tmp, json).await.map_err(io_err)?;
        fs::rename(&tmp, self.path(name)).await.map_err(io_err)
    }
}
