//! Property-based tests for the mistake ledger merge.
//!
//! These tests use proptest to verify:
//! - Merge is commutative and associative
//! - Merging a ledger with itself equals evicting it
//! - Nothing older than the retention window survives
//! - The later timestamp wins on conflict

#![cfg(test)]

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::{retention_window, ItemId, MistakeLedger, Time};

fn now() -> Time {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

// =============================================================================
// Arbitrary Generators
// =============================================================================

prop_compose! {
    // Offsets span roughly two days either side of the cutoff so that both
    // live and expired entries show up.
    fn arb_time()(minutes_ago in -120i64..3_000) -> Time {
        now() - Duration::minutes(minutes_ago)
    }
}

prop_compose! {
    fn arb_ledger()(
        entries in prop::collection::vec((0i32..40, arb_time()), 0..24),
    ) -> MistakeLedger {
        entries.into_iter().map(|(id, at)| (ItemId(id), at)).collect()
    }
}

fn merge(a: &MistakeLedger, b: &MistakeLedger) -> MistakeLedger {
    MistakeLedger::merge(a, b, now(), retention_window())
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn merge_is_commutative(a in arb_ledger(), b in arb_ledger()) {
        prop_assert_eq!(merge(&a, &b), merge(&b, &a));
    }

    #[test]
    fn merge_is_associative(a in arb_ledger(), b in arb_ledger(), c in arb_ledger()) {
        prop_assert_eq!(merge(&merge(&a, &b), &c), merge(&a, &merge(&b, &c)));
    }

    #[test]
    fn merge_with_self_is_evict(a in arb_ledger()) {
        prop_assert_eq!(merge(&a, &a), a.evict(now(), retention_window()));
    }

    #[test]
    fn merge_drops_everything_expired(a in arb_ledger(), b in arb_ledger()) {
        let cutoff = now() - retention_window();
        for entry in merge(&a, &b).iter() {
            prop_assert!(entry.last_missed_at >= cutoff);
        }
    }

    #[test]
    fn merge_keeps_every_live_item(a in arb_ledger(), b in arb_ledger()) {
        let merged = merge(&a, &b);
        let cutoff = now() - retention_window();
        for entry in a.iter().chain(b.iter()) {
            if entry.last_missed_at >= cutoff {
                let kept = merged.get(entry.item_id);
                prop_assert!(kept.is_some_and(|at| at >= entry.last_missed_at));
            }
        }
    }

    #[test]
    fn later_timestamp_wins(id in 0i32..1000, older in 0i64..600, gap in 1i64..600) {
        let t1 = now() - Duration::minutes(older + gap);
        let t2 = now() - Duration::minutes(older);
        let a: MistakeLedger = [(ItemId(id), t1)].into_iter().collect();
        let b: MistakeLedger = [(ItemId(id), t2)].into_iter().collect();
        prop_assert_eq!(merge(&a, &b).get(ItemId(id)), Some(t2));
    }
}
