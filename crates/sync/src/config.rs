//! Sync configuration.

use std::time::Duration;
use shiori_core::retention_window;

/// Key suffix the ledger is stored under.
pub const LEDGER_KEY: &str = "tsurukame-mistakes";

/// Key touched on every push so other devices get a change notification.
pub const LAST_SYNC_KEY: &str = "lastSyncCall";

/// Configuration for the sync coordinator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Prepended to [`LEDGER_KEY`], e.g. to separate accounts
    pub key_prefix: Option<String>,
    /// How long a mistake is kept
    pub retention: chrono::Duration,
    /// Upper bound on each store call
    pub timeout: Duration,
    /// Quiet period after a local mistake before pushing
    pub push_debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            key_prefix: None,
            retention: retention_window(),
            timeout: Duration::from_secs(10),
            push_debounce: Duration::from_secs(2),
        }
    }
}

impl SyncConfig {
    /// Set the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Set the retention window.
    pub fn with_retention(mut self, retention: chrono::Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the push debounce.
    pub fn with_push_debounce(mut self, debounce: Duration) -> Self {
        self.push_debounce = debounce;
        self
    }

    /// Full key of the ledger entry.
    pub fn ledger_key(&self) -> String {
        format!("{}{}", self.key_prefix.as_deref().unwrap_or(""), LEDGER_KEY)
    }
}
