//! Level progression history.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use crate::Time;

/// The user's progress through one curriculum level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgression {
    /// Level number
    pub level: u32,

    /// When the level was unlocked
    #[serde(default)]
    pub unlocked_at: Option<Time>,

    /// When the user started the first lesson on it
    #[serde(default)]
    pub started_at: Option<Time>,

    /// When the level was passed
    #[serde(default)]
    pub passed_at: Option<Time>,
}

impl LevelProgression {
    /// Time spent on this level: from start (or unlock) until it was passed,
    /// or until `now` if it is still in progress. Zero for a locked level.
    pub fn time_spent(&self, now: Time) -> Duration {
        let Some(unlocked) = self.unlocked_at else {
            return Duration::zero();
        };
        let start = self.started_at.unwrap_or(unlocked);
        match self.passed_at {
            Some(passed) => passed - start,
            None => now - start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_time_spent_prefers_started_at() {
        let unlocked = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let level = LevelProgression {
            level: 4,
            unlocked_at: Some(unlocked),
            started_at: Some(unlocked + Duration::days(1)),
            passed_at: Some(unlocked + Duration::days(8)),
        };
        assert_eq!(level.time_spent(unlocked), Duration::days(7));
    }

    #[test]
    fn test_time_spent_in_progress_runs_to_now() {
        let unlocked = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let level = LevelProgression {
            level: 5,
            unlocked_at: Some(unlocked),
            started_at: None,
            passed_at: None,
        };
        assert_eq!(level.time_spent(unlocked + Duration::hours(30)), Duration::hours(30));
    }

    #[test]
    fn test_time_spent_locked_is_zero() {
        let level = LevelProgression { level: 6, unlocked_at: None, started_at: None, passed_at: None };
        assert_eq!(level.time_spent(Utc::now()), Duration::zero());
    }
}
