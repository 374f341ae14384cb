//! Property-based tests for the thought tracker.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Branch lists are always sorted and duplicate-free
//! - History length counts exactly the accepted submissions
//! - Total estimates are normalized upward, never downward
//! - Validation failures never mutate state
//! - Records roundtrip through their wire representation

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use seqthink::{ThoughtRecord, ThoughtTracker};

fn valid_record(number: i64, total: i64) -> ThoughtRecord {
    ThoughtRecord {
        thought: "step".to_string(),
        thought_number: number,
        total_thoughts: total,
        ..ThoughtRecord::default()
    }
}

/// Strategy for short branch identifiers drawn from a small alphabet, so
/// duplicates actually occur.
fn branch_id() -> impl Strategy<Value = String> {
    "[a-d]{1,2}"
}

proptest! {
    /// Property: branches are sorted ascending and duplicate-free after any
    /// submission sequence.
    #[test]
    fn prop_branches_sorted_and_deduped(ids in prop::collection::vec(branch_id(), 0..20)) {
        let tracker = ThoughtTracker::default();

        let mut last = None;
        for (i, id) in ids.iter().enumerate() {
            let record = ThoughtRecord {
                branch_from_thought: Some(1),
                branch_id: Some(id.clone()),
                ..valid_record(i64::try_from(i).unwrap() + 1, 20)
            };
            last = Some(tracker.submit(&record).unwrap());
        }

        if let Some(snapshot) = last {
            prop_assert!(snapshot.branches.windows(2).all(|w| w[0] < w[1]));

            let mut expected: Vec<String> = ids.clone();
            expected.sort();
            expected.dedup();
            prop_assert_eq!(snapshot.branches, expected);
        }
    }

    /// Property: after N accepted submissions the history length is exactly N,
    /// and the k-th call reports k.
    #[test]
    fn prop_history_counts_every_accepted_call(n in 1usize..50) {
        let tracker = ThoughtTracker::default();

        for k in 1..=n {
            let snapshot = tracker.submit(&valid_record(1, 1)).unwrap();
            prop_assert_eq!(snapshot.thought_history_length, k as u64);
        }
        prop_assert_eq!(tracker.history_len(), n as u64);
    }

    /// Property: the returned total is the max of the caller's number and
    /// estimate.
    #[test]
    fn prop_total_is_max_of_number_and_estimate(number in 1i64..1000, total in 1i64..1000) {
        let tracker = ThoughtTracker::default();
        let snapshot = tracker.submit(&valid_record(number, total)).unwrap();

        prop_assert_eq!(snapshot.total_thoughts, number.max(total));
        prop_assert_eq!(snapshot.thought_number, number);
    }

    /// Property: invalid submissions leave both history and branches
    /// untouched.
    #[test]
    fn prop_invalid_input_never_mutates(number in -5i64..=0, total in -5i64..=0) {
        let tracker = ThoughtTracker::default();

        let record = ThoughtRecord {
            branch_from_thought: Some(1),
            branch_id: Some("orphan".to_string()),
            ..valid_record(number, total)
        };
        prop_assert!(tracker.submit(&record).is_err());
        prop_assert_eq!(tracker.history_len(), 0);
        prop_assert!(tracker.branches().is_empty());
    }

    /// Property: a branch id without a branching point never registers,
    /// whatever the id.
    #[test]
    fn prop_branch_id_alone_never_registers(id in "[a-z]{1,8}") {
        let tracker = ThoughtTracker::default();

        let record = ThoughtRecord {
            branch_id: Some(id),
            ..valid_record(1, 1)
        };
        let snapshot = tracker.submit(&record).unwrap();
        prop_assert!(snapshot.branches.is_empty());
    }

    /// Property: records roundtrip through JSON unchanged.
    #[test]
    fn prop_record_json_roundtrip(
        thought in "[a-zA-Z0-9 ]{1,40}",
        number in 1i64..100,
        total in 1i64..100,
        next in any::<bool>(),
        branch in proptest::option::of(("[1-9]", "[a-z]{1,5}")),
    ) {
        let record = ThoughtRecord {
            thought,
            next_thought_needed: next,
            thought_number: number,
            total_thoughts: total,
            branch_from_thought: branch.as_ref().map(|(n, _)| n.parse().unwrap()),
            branch_id: branch.map(|(_, id)| id),
            ..ThoughtRecord::default()
        };

        let json = serde_json::to_string(&record).unwrap();
        let decoded: ThoughtRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(record, decoded);
    }
}
