//! SRS schedule: how fast an item can possibly climb, and when each item
//! of a cohort is projected to pass.

use chrono::{DateTime, Duration, DurationRound, Utc};
use shiori_core::{Assignment, SrsStage, Time};

/// Shortest possible time for an item at `level` to climb from `from_stage`
/// to the target stage.
pub trait MinimumLevelDuration {
    /// Minimum duration. `from_stage` is `Apprentice1` for a freshly
    /// unlocked item.
    fn minimum_duration(&self, level: u32, from_stage: SrsStage) -> Duration;
}

impl<F> MinimumLevelDuration for F
where
    F: Fn(u32, SrsStage) -> Duration,
{
    fn minimum_duration(&self, level: u32, from_stage: SrsStage) -> Duration {
        self(level, from_stage)
    }
}

/// Minimum hours from `stage` to Guru I for an item on `level`.
///
/// Levels 1 and 2 run on the accelerated schedule.
pub fn minimum_time_until_guru(stage: SrsStage, level: u32) -> Duration {
    let accelerated = level <= 2;
    let intervals: [i64; 4] = if accelerated { [2, 4, 8, 23] } else { [4, 8, 23, 47] };

    let hours: i64 = match stage {
        SrsStage::Apprentice1 => intervals.iter().sum(),
        SrsStage::Apprentice2 => intervals[1..].iter().sum(),
        SrsStage::Apprentice3 => intervals[2..].iter().sum(),
        SrsStage::Apprentice4 => intervals[3],
        _ => 0,
    };
    Duration::hours(hours)
}

/// The published WaniKani interval table.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaniKaniSchedule;

impl MinimumLevelDuration for WaniKaniSchedule {
    fn minimum_duration(&self, level: u32, from_stage: SrsStage) -> Duration {
        minimum_time_until_guru(from_stage, level)
    }
}

/// Per-item projection of when an unlocked assignment reaches the target
/// stage.
pub trait PassDateProjector: Send + Sync {
    /// Projected date, or `None` if this item cannot be placed.
    fn project(&self, assignment: &Assignment, now: Time) -> Option<Time>;
}

impl<F> PassDateProjector for F
where
    F: Fn(&Assignment, Time) -> Option<Time> + Send + Sync,
{
    fn project(&self, assignment: &Assignment, now: Time) -> Option<Time> {
        self(assignment, now)
    }
}

/// Projects the Guru date assuming every upcoming review is answered
/// correctly as soon as it becomes available.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuruDateProjector;

impl PassDateProjector for GuruDateProjector {
    fn project(&self, assignment: &Assignment, now: Time) -> Option<Time> {
        if let Some(completed) = assignment.completed_at {
            return Some(completed);
        }
        if assignment.srs_stage.is_passed() {
            // Passed without a recorded date: sorts before everything else.
            return Some(DateTime::<Utc>::MIN_UTC);
        }
        let review = review_date(assignment, now)?;
        Some(review + minimum_time_until_guru(assignment.srs_stage.next(), assignment.level))
    }
}

/// When the next review of `assignment` is expected to happen.
///
/// Reviews are assumed to happen within the hour they become available, so a
/// review that is already due is placed at the start of the current hour.
/// Locked and burned assignments have no next review.
pub fn review_date(assignment: &Assignment, now: Time) -> Option<Time> {
    if assignment.is_locked() || assignment.srs_stage == SrsStage::Burned {
        return None;
    }
    let this_hour = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
    match assignment.available_at {
        Some(at) if at > this_hour => Some(at),
        _ => Some(this_hour),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shiori_core::SubjectKind;

    fn now() -> Time {
        Utc.with_ymd_and_hms(2024, 4, 10, 9, 41, 12).unwrap()
    }

    #[test]
    fn test_minimum_time_regular_levels() {
        assert_eq!(minimum_time_until_guru(SrsStage::Apprentice1, 10), Duration::hours(82));
        assert_eq!(minimum_time_until_guru(SrsStage::Apprentice3, 10), Duration::hours(70));
        assert_eq!(minimum_time_until_guru(SrsStage::Apprentice4, 10), Duration::hours(47));
        assert_eq!(minimum_time_until_guru(SrsStage::Guru1, 10), Duration::zero());
        assert_eq!(minimum_time_until_guru(SrsStage::Initiate, 10), Duration::zero());
    }

    #[test]
    fn test_minimum_time_accelerated_levels() {
        assert_eq!(minimum_time_until_guru(SrsStage::Apprentice1, 1), Duration::hours(37));
        assert_eq!(minimum_time_until_guru(SrsStage::Apprentice2, 2), Duration::hours(35));
        assert_eq!(minimum_time_until_guru(SrsStage::Apprentice1, 3), Duration::hours(82));
    }

    #[test]
    fn test_closure_as_minimum_duration() {
        let flat = |_level: u32, _stage: SrsStage| Duration::hours(5);
        assert_eq!(flat.minimum_duration(9, SrsStage::Apprentice1), Duration::hours(5));
        assert_eq!(
            WaniKaniSchedule.minimum_duration(9, SrsStage::Apprentice1),
            Duration::hours(82)
        );
    }

    #[test]
    fn test_projection_for_completed_item() {
        let done = now() - Duration::days(2);
        let a = Assignment::new(1, SubjectKind::Kanji, 5)
            .with_stage(SrsStage::Guru2)
            .with_unlocked_at(done - Duration::days(5))
            .with_completed_at(done);
        assert_eq!(GuruDateProjector.project(&a, now()), Some(done));
    }

    #[test]
    fn test_projection_for_passed_item_without_date() {
        let a = Assignment::new(1, SubjectKind::Kanji, 5)
            .with_stage(SrsStage::Guru1)
            .with_unlocked_at(now());
        assert_eq!(GuruDateProjector.project(&a, now()), Some(DateTime::<Utc>::MIN_UTC));
    }

    #[test]
    fn test_projection_review_available_now_uses_current_hour() {
        let a = Assignment::new(1, SubjectKind::Kanji, 5)
            .with_stage(SrsStage::Apprentice3)
            .with_unlocked_at(now() - Duration::days(1))
            .with_available_at(now() - Duration::hours(2));
        let hour = Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap();
        assert_eq!(GuruDateProjector.project(&a, now()), Some(hour + Duration::hours(47)));
    }

    #[test]
    fn test_projection_future_review_starts_from_availability() {
        let available = now() + Duration::hours(6);
        let a = Assignment::new(1, SubjectKind::Kanji, 5)
            .with_stage(SrsStage::Apprentice1)
            .with_unlocked_at(now() - Duration::hours(4))
            .with_available_at(available);
        assert_eq!(
            GuruDateProjector.project(&a, now()),
            Some(available + Duration::hours(78))
        );
    }

    #[test]
    fn test_review_date() {
        let hour = Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap();
        let unlocked = Assignment::new(1, SubjectKind::Radical, 5)
            .with_stage(SrsStage::Apprentice2)
            .with_unlocked_at(now() - Duration::days(1));

        assert_eq!(review_date(&unlocked, now()), Some(hour));
        let later = now() + Duration::hours(3);
        assert_eq!(review_date(&unlocked.clone().with_available_at(later), now()), Some(later));
        assert_eq!(
            review_date(&unlocked.clone().with_available_at(now() - Duration::hours(5)), now()),
            Some(hour)
        );
        assert_eq!(review_date(&unlocked.with_stage(SrsStage::Burned), now()), None);
        assert_eq!(review_date(&Assignment::new(2, SubjectKind::Kanji, 5), now()), None);
    }

    #[test]
    fn test_projection_skips_locked_item() {
        let a = Assignment::new(1, SubjectKind::Kanji, 5);
        assert_eq!(GuruDateProjector.project(&a, now()), None);
    }
}
