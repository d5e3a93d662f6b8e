//! In-memory key/value store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use super::{KeyValueStore, Result, StorageError};

/// Key/value store held in process memory.
///
/// Can be switched offline to exercise the failure paths of its callers.
#[derive(Debug)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, Vec<u8>>>,
    available: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryKeyValueStore {
    /// Create an empty, reachable store.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
        }
    }

    /// Toggle reachability. While unavailable every read and write fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store is offline".to_string()))
        }
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_available()?;
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.check_available()?;
        debug!(key, bytes = value.len(), "memory store write");
        self.values.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn synchronize(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
