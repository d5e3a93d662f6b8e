//! Progress time estimation.
//!
//! Projects when the current level's cohort of assignments will reach the
//! target stage, falling back to the user's historical level pace while
//! some of the cohort is still locked.

#![warn(missing_docs)]

pub mod estimator;
pub mod schedule;
pub mod level_time;

pub use estimator::{ProjectedCompletion, TimeEstimator, OUTLIER_FRACTION};
pub use schedule::{
    minimum_time_until_guru, review_date, GuruDateProjector, MinimumLevelDuration,
    PassDateProjector, WaniKaniSchedule,
};
pub use level_time::average_remaining_level_time;
