//! Core error type.

use crate::ItemId;

/// Error type for core model operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised when model invariants are violated.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An assignment's dates contradict each other
    #[error("malformed assignment {subject_id}: {reason}")]
    MalformedAssignment {
        /// Offending subject
        subject_id: ItemId,
        /// What is wrong with it
        reason: String,
    },
}
