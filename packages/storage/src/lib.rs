//! Batch archive.
//!
//! Every accepted batch gets its own folder holding the raw inputs and a
//! `config.json` snapshot, so an operator can see what was submitted.
//! The dispatcher never reads the archive back.
//!
//! Backends come from `object_store`:
//! - On-disk storage for normal runs
//! - In-memory storage for tests

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use dispatch_core::{BatchSnapshot, RunId, ValidatedBatch};
use object_store::ObjectStore;
use object_store::ObjectStoreExt;
use object_store::path::Path;

pub const DESTINATION_FILE: &str = "destination.txt";
pub const MESSAGES_FILE: &str = "messages.txt";
pub const INTERVAL_FILE: &str = "interval.txt";
pub const CONFIG_FILE: &str = "config.json";

const DEFAULT_ROOT: &str = "./data/batches";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid archive config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object_store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Filesystem,
    Memory,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Filesystem => "filesystem",
            StorageKind::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveConfig {
    Filesystem { root: PathBuf },
    Memory,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self::filesystem(DEFAULT_ROOT)
    }
}

impl ArchiveConfig {
    pub fn memory() -> Self {
        Self::Memory
    }

    pub fn filesystem(root: impl Into<PathBuf>) -> Self {
        Self::Filesystem { root: root.into() }
    }

    /// Build a config from environment variables.
    ///
    /// - `ARCHIVE_BACKEND`: `filesystem` (default) or `memory`
    /// - `ARCHIVE_ROOT`: folder for the filesystem backend (default: `./data/batches`)
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let root = || {
            lookup("ARCHIVE_ROOT")
                .and_then(non_empty)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
        };

        match lookup("ARCHIVE_BACKEND").and_then(non_empty).as_deref() {
            None | Some("filesystem") | Some("fs") => Ok(Self::filesystem(root())),
            Some("memory") | Some("mem") => Ok(Self::memory()),
            Some(other) => Err(StorageError::InvalidConfig(format!(
                "unsupported ARCHIVE_BACKEND={other} (expected filesystem|memory)"
            ))),
        }
    }
}

/// Writes one folder per accepted batch.
#[derive(Clone)]
pub struct BatchArchive {
    kind: StorageKind,
    store: Arc<dyn ObjectStore>,
}

impl BatchArchive {
    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn kind_str(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn new(cfg: ArchiveConfig) -> Result<Self, StorageError> {
        let (kind, store) = match cfg {
            ArchiveConfig::Filesystem { root } => {
                ensure_dir(&root)?;
                let fs = object_store::local::LocalFileSystem::new_with_prefix(&root)?;
                (StorageKind::Filesystem, Arc::new(fs) as _)
            }
            ArchiveConfig::Memory => {
                let mem = object_store::memory::InMemory::new();
                (StorageKind::Memory, Arc::new(mem) as _)
            }
        };

        Ok(Self { kind, store })
    }

    pub fn from_env() -> Result<Self, StorageError> {
        Self::new(ArchiveConfig::from_env()?)
    }

    /// Folder name for a batch: `<destination>_<run id>`.
    pub fn folder_for(destination_id: &str, run_id: RunId) -> String {
        let destination: String = destination_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{destination}_{run_id}")
    }

    /// Write the batch inputs and its snapshot. Returns the folder name.
    ///
    /// Credentials are not written; the snapshot only carries their count.
    pub async fn record(
        &self,
        snapshot: &BatchSnapshot,
        batch: &ValidatedBatch,
    ) -> Result<String, StorageError> {
        let folder = Self::folder_for(&snapshot.destination_id, snapshot.run_id);
        let config = serde_json::to_vec_pretty(snapshot)?;

        let files = [
            (DESTINATION_FILE, Bytes::from(batch.destination_id.clone())),
            (MESSAGES_FILE, Bytes::from(batch.messages.join("\n"))),
            (
                INTERVAL_FILE,
                Bytes::from(batch.pacing_interval_secs.to_string()),
            ),
            (CONFIG_FILE, Bytes::from(config)),
        ];
        for (name, contents) in files {
            self.put_bytes(&format!("{folder}/{name}"), contents).await?;
        }

        tracing::info!(folder = %folder, backend = self.kind_str(), "archived batch");
        Ok(folder)
    }

    /// Read back a batch snapshot.
    pub async fn snapshot(&self, folder: &str) -> Result<BatchSnapshot, StorageError> {
        let bytes = self.get_bytes(&format!("{folder}/{CONFIG_FILE}")).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn to_path(key: &str) -> Result<Path, StorageError> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(StorageError::InvalidConfig(
                "object key must not be empty".to_string(),
            ));
        }
        Ok(Path::from(key))
    }

    pub async fn put_bytes(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let path = Self::to_path(key)?;
        self.store
            .put(&path, object_store::PutPayload::from(bytes))
            .await?;
        Ok(())
    }

    pub async fn get_bytes(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = Self::to_path(key)?;
        let res = self.store.get(&path).await?;
        Ok(res.bytes().await?)
    }
}

fn ensure_dir(root: &FsPath) -> Result<(), StorageError> {
    std::fs::create_dir_all(root)?;
    Ok(())
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
