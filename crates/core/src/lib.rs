//! Shiori core data models.
//!
//! This crate defines the data structures shared by the progress estimator
//! and the cross-device mistake sync: assignments and their SRS stages,
//! level history, and the recent-mistake ledger.

#![warn(missing_docs)]

// Core identities
mod id;

// Curriculum
mod assignment;
mod level;

// Mistake tracking
mod ledger;

// Time and errors
mod clock;
mod error;

#[cfg(test)]
mod merge_props;

// Re-exports
pub use id::{ItemId, SyncId};

pub use assignment::{Assignment, SrsStage, SubjectKind};
pub use level::LevelProgression;
pub use ledger::{retention_window, MistakeEntry, MistakeLedger};

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, Result};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
