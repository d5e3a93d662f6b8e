//! Historical level pace.

use chrono::Duration;
use shiori_core::{LevelProgression, Time};

/// How much longer the current level should take, judging by how long the
/// user spent on the middle half of their past levels.
///
/// The last entry (by level number) is the level in progress; its time so
/// far is subtracted from the historical mean. The result is negative when
/// the user is already slower than usual, and zero with no completed levels.
pub fn average_remaining_level_time(levels: &[LevelProgression], now: Time) -> Duration {
    let mut ordered: Vec<&LevelProgression> = levels.iter().collect();
    ordered.sort_by_key(|l| l.level);
    let spent: Vec<Duration> = ordered.iter().map(|l| l.time_spent(now)).collect();

    let Some(&current) = spent.last() else {
        return Duration::zero();
    };
    let last = spent.len() - 1;

    let lower = last / 4 + usize::from(last % 4 == 3);
    let upper = last * 3 / 4 + usize::from(last == 1);
    let middle = &spent[lower..upper];
    if middle.is_empty() {
        return Duration::zero();
    }

    let total_ms: i64 = middle.iter().map(|d| d.num_milliseconds()).sum();
    Duration::milliseconds(total_ms / middle.len() as i64) - current
}
