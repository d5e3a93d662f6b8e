//! Cross-device sync of the recent-mistake ledger.
//!
//! The coordinator owns the authoritative in-process ledger. Every local
//! mistake and every remote pull goes through it, and readers only ever see
//! immutable snapshots.

#![warn(missing_docs)]

pub mod config;
pub mod coordinator;

pub use config::{SyncConfig, LAST_SYNC_KEY, LEDGER_KEY};
pub use coordinator::SyncCoordinator;

/// Errors produced by a sync cycle. None of them are fatal: the local ledger
/// stays usable after any of them.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A store read or write failed or timed out
    #[error("store unavailable during {operation}: {reason}")]
    StoreUnavailable {
        /// What was being attempted
        operation: &'static str,
        /// Underlying failure
        reason: String,
    },

    /// The ledger could not be serialized
    #[error("failed to encode ledger: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
