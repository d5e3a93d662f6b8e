//! Recent-mistake ledger.
//!
//! A last-writer-wins map from item id to the last time the item was
//! answered incorrectly. Entries older than the retention window vanish on
//! the next merge or eviction, which stands in for explicit tombstones: the
//! only question the ledger answers is "was this item missed recently", and
//! that answer expires on its own.

use std::collections::btree_map::{self, BTreeMap};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use crate::id::ItemId;
use crate::Time;

/// How long a mistake stays in the ledger.
pub fn retention_window() -> Duration {
    Duration::hours(24)
}

/// One ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeEntry {
    /// Item that was missed
    pub item_id: ItemId,

    /// When it was last missed
    pub last_missed_at: Time,
}

/// Item id to last-missed timestamp.
///
/// Serializes as a JSON object keyed by the integer item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MistakeLedger {
    entries: BTreeMap<ItemId, Time>,
}

impl MistakeLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `item_id` was missed at `at`. An existing entry is only
    /// replaced by a later timestamp.
    pub fn record(&mut self, item_id: ItemId, at: Time) {
        match self.entries.entry(item_id) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(at);
            }
            btree_map::Entry::Occupied(mut slot) => {
                if at > *slot.get() {
                    slot.insert(at);
                }
            }
        }
    }

    /// Merge two ledgers.
    ///
    /// Keeps every entry of either side with `last_missed_at >= now - retention`;
    /// where both sides hold the same item the later timestamp wins. The
    /// result does not depend on argument order, and merging a ledger with
    /// itself is the same as evicting it.
    pub fn merge(a: &MistakeLedger, b: &MistakeLedger, now: Time, retention: Duration) -> MistakeLedger {
        let cutoff = cutoff(now, retention);
        let mut merged = MistakeLedger::new();
        for (item_id, at) in a.entries.iter().chain(b.entries.iter()) {
            if *at >= cutoff {
                merged.record(*item_id, *at);
            }
        }
        merged
    }

    /// Drop entries older than the retention window.
    pub fn evict(&self, now: Time, retention: Duration) -> MistakeLedger {
        Self::merge(self, &MistakeLedger::new(), now, retention)
    }

    /// Last time `item_id` was missed, if recorded.
    pub fn get(&self, item_id: ItemId) -> Option<Time> {
        self.entries.get(&item_id).copied()
    }

    /// Whether `item_id` was missed within the retention window.
    pub fn contains_recent(&self, item_id: ItemId, now: Time, retention: Duration) -> bool {
        self.get(item_id).is_some_and(|at| at >= cutoff(now, retention))
    }

    /// Items missed within the retention window, in id order.
    pub fn recent_item_ids(&self, now: Time, retention: Duration) -> Vec<ItemId> {
        let cutoff = cutoff(now, retention);
        self.entries
            .iter()
            .filter(|(_, at)| **at >= cutoff)
            .map(|(item_id, _)| *item_id)
            .collect()
    }

    /// Number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = MistakeEntry> + '_ {
        self.entries.iter().map(|(item_id, at)| MistakeEntry {
            item_id: *item_id,
            last_missed_at: *at,
        })
    }
}

impl FromIterator<MistakeEntry> for MistakeLedger {
    fn from_iter<I: IntoIterator<Item = MistakeEntry>>(iter: I) -> Self {
        let mut ledger = MistakeLedger::new();
        for entry in iter {
            ledger.record(entry.item_id, entry.last_missed_at);
        }
        ledger
    }
}

impl FromIterator<(ItemId, Time)> for MistakeLedger {
    fn from_iter<I: IntoIterator<Item = (ItemId, Time)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(item_id, last_missed_at)| MistakeEntry { item_id, last_missed_at })
            .collect()
    }
}

fn cutoff(now: Time, retention: Duration) -> Time {
    now.checked_sub_signed(retention)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> Time {
        Utc.with_ymd_and_hms(2024, 5, 20, 18, 30, 0).unwrap()
    }

    fn hours_ago(h: i64) -> Time {
        now() - Duration::hours(h)
    }

    fn ledger(entries: &[(i32, Time)]) -> MistakeLedger {
        entries.iter().map(|(id, at)| (ItemId(*id), *at)).collect()
    }

    fn merge_both_ways(a: &MistakeLedger, b: &MistakeLedger) -> MistakeLedger {
        let ab = MistakeLedger::merge(a, b, now(), retention_window());
        let ba = MistakeLedger::merge(b, a, now(), retention_window());
        assert_eq!(ab, ba);
        ab
    }

    #[test]
    fn test_empty_merge_gives_nothing() {
        let out = merge_both_ways(&MistakeLedger::new(), &MistakeLedger::new());
        assert!(out.is_empty());
    }

    #[test]
    fn test_merge_one_side_only() {
        let mistakes = ledger(&[(42, hours_ago(10)), (44, hours_ago(4))]);
        let out = merge_both_ways(&mistakes, &MistakeLedger::new());
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(ItemId(42)), Some(hours_ago(10)));
        assert_eq!(out.get(ItemId(44)), Some(hours_ago(4)));
    }

    #[test]
    fn test_old_dates_removed() {
        let mistakes = ledger(&[(42, hours_ago(42)), (44, hours_ago(88))]);
        let other = ledger(&[(41, hours_ago(33))]);
        assert!(merge_both_ways(&mistakes, &other).is_empty());
    }

    #[test]
    fn test_entry_exactly_at_cutoff_is_kept() {
        let mistakes = ledger(&[(42, hours_ago(24))]);
        let out = mistakes.evict(now(), retention_window());
        assert_eq!(out.get(ItemId(42)), Some(hours_ago(24)));
    }

    #[test]
    fn test_disjoint_items_are_unioned() {
        let mistakes = ledger(&[(42, hours_ago(10))]);
        let other = ledger(&[(44, hours_ago(4))]);
        let out = merge_both_ways(&mistakes, &other);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(ItemId(42)), Some(hours_ago(10)));
        assert_eq!(out.get(ItemId(44)), Some(hours_ago(4)));
    }

    #[test]
    fn test_identical_entries_collapse() {
        let mistakes = ledger(&[(42, hours_ago(10)), (44, hours_ago(4))]);
        let out = merge_both_ways(&mistakes, &mistakes.clone());
        assert_eq!(out, mistakes);
    }

    #[test]
    fn test_conflict_keeps_later_timestamp() {
        let mistakes = ledger(&[(42, hours_ago(10)), (44, hours_ago(10)), (46, hours_ago(1))]);
        let other = ledger(&[(42, hours_ago(4)), (46, hours_ago(10))]);
        let out = merge_both_ways(&mistakes, &other);
        assert_eq!(out.len(), 3);
        assert_eq!(out.get(ItemId(42)), Some(hours_ago(4)));
        assert_eq!(out.get(ItemId(44)), Some(hours_ago(10)));
        assert_eq!(out.get(ItemId(46)), Some(hours_ago(1)));
    }

    #[test]
    fn test_conflict_with_one_side_expired() {
        // The expired side must not resurrect or shadow the live one.
        let mistakes = ledger(&[(42, hours_ago(30))]);
        let other = ledger(&[(42, hours_ago(2))]);
        let out = merge_both_ways(&mistakes, &other);
        assert_eq!(out.get(ItemId(42)), Some(hours_ago(2)));
    }

    #[test]
    fn test_two_device_scenario() {
        let t0 = now() - Duration::hours(1);
        let a = ledger(&[(1, t0)]);
        let b = ledger(&[(1, t0 + Duration::hours(1)), (2, t0 - Duration::hours(30))]);
        let out = merge_both_ways(&a, &b);
        assert_eq!(out, ledger(&[(1, t0 + Duration::hours(1))]));
    }

    #[test]
    fn test_record_never_moves_backwards() {
        let mut mistakes = MistakeLedger::new();
        mistakes.record(ItemId(5), hours_ago(2));
        mistakes.record(ItemId(5), hours_ago(6));
        assert_eq!(mistakes.get(ItemId(5)), Some(hours_ago(2)));
        mistakes.record(ItemId(5), hours_ago(1));
        assert_eq!(mistakes.get(ItemId(5)), Some(hours_ago(1)));
    }

    #[test]
    fn test_recent_queries_ignore_expired_entries() {
        let mistakes = ledger(&[(1, hours_ago(3)), (2, hours_ago(25)), (3, hours_ago(23))]);
        assert!(mistakes.contains_recent(ItemId(1), now(), retention_window()));
        assert!(!mistakes.contains_recent(ItemId(2), now(), retention_window()));
        assert!(!mistakes.contains_recent(ItemId(9), now(), retention_window()));
        assert_eq!(
            mistakes.recent_item_ids(now(), retention_window()),
            vec![ItemId(1), ItemId(3)]
        );
    }

    #[test]
    fn test_serializes_as_integer_keyed_object() {
        let mistakes = ledger(&[(42, now())]);
        let json = serde_json::to_value(&mistakes).unwrap();
        assert!(json.get("42").is_some());

        let back: MistakeLedger = serde_json::from_value(json).unwrap();
        assert_eq!(back, mistakes);
    }
}
