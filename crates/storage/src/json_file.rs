//! JSON file key/value store.
//!
//! Stores each key as one file under a root directory, named by the
//! percent-encoded key. Every write goes to its own temporary file in the
//! same directory and is renamed into place, so a reader never sees a
//! half-written value even with several writers. `synchronize` fsyncs every
//! file written since the previous call.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use super::{KeyValueStore, Result, StorageError};

/// Directory-backed key/value store.
pub struct JsonFileStore {
    root: PathBuf,
    pending: Mutex<BTreeSet<PathBuf>>,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            pending: Mutex::new(BTreeSet::new()),
        })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::Other("empty key".to_string()));
        }
        Ok(self.root.join(format!("{}.json", urlencoding::encode(key))))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        read_bytes(&self.key_path(key)?).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let path = self.key_path(key)?;
        let bytes = value.len();
        let (root, target) = (self.root.clone(), path.clone());
        tokio::task::spawn_blocking(move || write_replacing(&root, &target, &value))
            .await
            .map_err(|e| StorageError::Other(format!("write task failed: {e}")))??;
        debug!(key, path = %path.display(), bytes, "stored value");

        self.pending.lock().await.insert(path);
        Ok(())
    }

    async fn synchronize(&self) -> bool {
        let pending: Vec<PathBuf> = std::mem::take(&mut *self.pending.lock().await)
            .into_iter()
            .collect();

        let mut ok = true;
        for path in pending {
            let synced = match fs::File::open(&path).await {
                Ok(file) => file.sync_all().await,
                Err(e) => Err(e),
            };
            if let Err(e) = synced {
                warn!(path = %path.display(), error = %e, "failed to flush value");
                ok = false;
            }
        }
        ok
    }
}

fn write_replacing(root: &Path, path: &Path, value: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(root)?;
    tmp.write_all(value)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

async fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
