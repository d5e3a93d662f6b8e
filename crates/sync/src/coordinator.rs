//! The sync coordinator - single owner of the in-process mistake ledger.
//!
//! A sync cycle reads the remote snapshot, merges it into the local ledger,
//! persists the result locally and pushes it back together with a
//! `lastSyncCall` timestamp that other devices watch for changes.
//!
//! ```text
//! remote.get ─► merge(latest local, remote) ─► local.set ─► remote.set ─► synchronize
//! ```
//!
//! The merge happens after the remote read completes and under the ledger
//! lock, so mistakes recorded while the read was in flight are merged too.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use shiori_core::{Clock, ItemId, MistakeLedger, SyncId, SystemClock, Time};
use shiori_storage::{KeyValueStore, KeyValueStoreExt};
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use crate::config::{SyncConfig, LAST_SYNC_KEY};
use crate::{Result, SyncError};

struct Shared {
    ledger: Mutex<MistakeLedger>,
    snapshots: watch::Sender<MistakeLedger>,
    sync_gate: Mutex<()>,
    resync_requested: AtomicBool,
    push_scheduled: AtomicBool,
}

/// Owns the mistake ledger and keeps it in step with the shared store.
///
/// Cheap to clone; clones share the same ledger.
#[derive(Clone)]
pub struct SyncCoordinator {
    remote: Arc<dyn KeyValueStore>,
    local: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    state: Arc<Shared>,
}

impl SyncCoordinator {
    /// Create a coordinator with an empty ledger syncing against `remote`.
    pub fn new(remote: Arc<dyn KeyValueStore>) -> Self {
        let (snapshots, _) = watch::channel(MistakeLedger::new());
        Self {
            remote,
            local: None,
            clock: Arc::new(SystemClock),
            config: SyncConfig::default(),
            state: Arc::new(Shared {
                ledger: Mutex::new(MistakeLedger::new()),
                snapshots,
                sync_gate: Mutex::new(()),
                resync_requested: AtomicBool::new(false),
                push_scheduled: AtomicBool::new(false),
            }),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist every merged ledger to `local` as well.
    pub fn with_local_store(mut self, local: Arc<dyn KeyValueStore>) -> Self {
        self.local = Some(local);
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Load the last locally persisted ledger into memory.
    pub async fn restore(&self) -> Result<MistakeLedger> {
        let Some(local) = &self.local else {
            return Ok(self.snapshot().await);
        };
        let bytes = self
            .bounded("restore", local.get(&self.config.ledger_key()))
            .await?;
        let saved = decode_or_empty(bytes, "local");

        let now = self.clock.now();
        let restored = {
            let mut ledger = self.state.ledger.lock().await;
            let restored = MistakeLedger::merge(&ledger, &saved, now, self.config.retention);
            *ledger = restored.clone();
            self.publish(&ledger, now);
            restored
        };
        debug!(entries = restored.len(), "restored mistake ledger");
        Ok(restored)
    }

    /// Record a mistake on `item_id` now.
    pub async fn record(&self, item_id: ItemId) {
        let now = self.clock.now();
        self.record_at(item_id, now).await;
    }

    /// Record a mistake on `item_id` at `at` and schedule a push.
    pub async fn record_at(&self, item_id: ItemId, at: Time) {
        let now = self.clock.now();
        {
            let mut ledger = self.state.ledger.lock().await;
            ledger.record(item_id, at);
            self.publish(&ledger, now);
        }
        debug!(%item_id, "recorded mistake");
        self.schedule_push();
    }

    /// Current ledger with expired entries removed.
    pub async fn snapshot(&self) -> MistakeLedger {
        let now = self.clock.now();
        self.state.ledger.lock().await.evict(now, self.config.retention)
    }

    /// Whether `item_id` was missed within the retention window.
    pub async fn is_recent_mistake(&self, item_id: ItemId) -> bool {
        let now = self.clock.now();
        self.state
            .ledger
            .lock()
            .await
            .contains_recent(item_id, now, self.config.retention)
    }

    /// Watch ledger snapshots. A new value is published after every local
    /// record and every merge.
    pub fn subscribe(&self) -> watch::Receiver<MistakeLedger> {
        self.state.snapshots.subscribe()
    }

    /// Pull, merge, persist and push.
    ///
    /// On a read failure the local ledger is left as it was. On a write
    /// failure the merged ledger has already been adopted locally and the
    /// error only reports that the push did not happen.
    pub async fn sync(&self) -> Result<MistakeLedger> {
        let gate = self.state.sync_gate.lock().await;
        self.sync_gated(gate).await
    }

    /// React to a change notification from the remote store.
    ///
    /// Returns `None` when a sync is already running; that sync will run
    /// once more after it finishes, however many notifications arrive.
    pub async fn on_remote_change(&self) -> Option<Result<MistakeLedger>> {
        self.state.resync_requested.store(true, Ordering::SeqCst);
        match self.state.sync_gate.try_lock() {
            Ok(gate) => Some(self.sync_gated(gate).await),
            Err(_) => {
                debug!("sync in flight, coalescing remote change");
                None
            }
        }
    }

    /// Run sync cycles while holding the gate until no change notification
    /// is pending.
    async fn sync_gated<'a>(&'a self, mut gate: MutexGuard<'a, ()>) -> Result<MistakeLedger> {
        loop {
            self.state.resync_requested.store(false, Ordering::SeqCst);
            let result = self.sync_once().await;
            drop(gate);

            if !self.state.resync_requested.load(Ordering::SeqCst) {
                return result;
            }
            // Whoever takes the gate next runs the follow-up.
            gate = match self.state.sync_gate.try_lock() {
                Ok(gate) => gate,
                Err(_) => return result,
            };
            debug!("remote changed during sync, syncing again");
        }
    }

    async fn sync_once(&self) -> Result<MistakeLedger> {
        let sync_id = SyncId::new();
        let key = self.config.ledger_key();

        let bytes = self.bounded("read", self.remote.get(&key)).await?;
        let remote = decode_or_empty(bytes, "remote");

        // Merge with the ledger as it is now, after the read.
        let now = self.clock.now();
        let (merged, local_len, dropped) = {
            let mut ledger = self.state.ledger.lock().await;
            let merged = MistakeLedger::merge(&ledger, &remote, now, self.config.retention);
            let local_len = ledger.len();
            let dropped = expired_count(&ledger, &remote, &merged);
            *ledger = merged.clone();
            self.publish(&ledger, now);
            (merged, local_len, dropped)
        };
        debug!(
            %sync_id,
            local = local_len,
            remote = remote.len(),
            merged = merged.len(),
            dropped,
            "merged mistake ledgers"
        );

        if let Some(local) = &self.local {
            // Failure is logged by `bounded`; the in-memory ledger is still authoritative.
            let _ = self.bounded("persist", local.set_json(&key, &merged)).await;
        }

        let encoded = serde_json::to_vec(&merged)?;
        self.bounded("write", self.remote.set(&key, encoded)).await?;
        self.bounded("write", self.remote.set_json(LAST_SYNC_KEY, &now)).await?;

        match timeout(self.config.timeout, self.remote.synchronize()).await {
            Ok(true) => {}
            Ok(false) => debug!(%sync_id, "remote flush did not happen"),
            Err(_) => warn!(%sync_id, "remote flush timed out"),
        }

        info!(%sync_id, entries = merged.len(), dropped, "mistake sync complete");
        Ok(merged)
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = shiori_storage::Result<T>>,
    {
        match timeout(self.config.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "store call failed");
                Err(SyncError::StoreUnavailable {
                    operation,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                warn!(operation, timeout = ?self.config.timeout, "store call timed out");
                Err(SyncError::StoreUnavailable {
                    operation,
                    reason: format!("timed out after {:?}", self.config.timeout),
                })
            }
        }
    }

    /// Send the live view of `ledger` to subscribers. Callers hold the
    /// ledger lock so snapshots go out in the order the ledger changed.
    fn publish(&self, ledger: &MistakeLedger, now: Time) {
        self.state.snapshots.send_replace(ledger.evict(now, self.config.retention));
    }

    fn schedule_push(&self) {
        if self.state.push_scheduled.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.config.push_debounce).await;
            this.state.push_scheduled.store(false, Ordering::SeqCst);
            if let Err(e) = this.sync().await {
                warn!(error = %e, "debounced mistake push failed");
            }
        });
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("config", &self.config)
            .field("has_local_store", &self.local.is_some())
            .finish_non_exhaustive()
    }
}

/// Items present on either side that the merge left out.
fn expired_count(local: &MistakeLedger, remote: &MistakeLedger, merged: &MistakeLedger) -> usize {
    let seen: BTreeSet<ItemId> = local.iter().chain(remote.iter()).map(|e| e.item_id).collect();
    seen.len().saturating_sub(merged.len())
}

fn decode_or_empty(bytes: Option<Vec<u8>>, source: &'static str) -> MistakeLedger {
    let Some(bytes) = bytes else {
        return MistakeLedger::new();
    };
    match serde_json::from_slice(&bytes) {
        Ok(ledger) => ledger,
        Err(e) => {
            warn!(source, error = %e, "unreadable mistake ledger, treating as empty");
            MistakeLedger::new()
        }
    }
}
