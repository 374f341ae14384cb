//! Concurrency tests for the thought tracker.
//!
//! Exercises the tracker from many threads at once and checks the guarantees
//! the snapshot contract makes: no lost increments, no duplicate counts, and
//! no torn reads between the history count and the branch list.

// Tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use seqthink::{ThoughtRecord, ThoughtSnapshot, ThoughtTracker};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const SUBMISSIONS_PER_THREAD: usize = 25;

fn record(thought: &str) -> ThoughtRecord {
    ThoughtRecord {
        thought: thought.to_string(),
        next_thought_needed: true,
        thought_number: 1,
        total_thoughts: 1,
        ..ThoughtRecord::default()
    }
}

fn submit_from_threads(
    tracker: &Arc<ThoughtTracker>,
    make_record: impl Fn(usize, usize) -> ThoughtRecord + Send + Sync + Copy + 'static,
) -> Vec<ThoughtSnapshot> {
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let tracker = Arc::clone(tracker);
            thread::spawn(move || {
                (0..SUBMISSIONS_PER_THREAD)
                    .map(|i| tracker.submit(&make_record(t, i)).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

#[test]
fn test_no_lost_updates_under_concurrency() {
    let tracker = Arc::new(ThoughtTracker::default());
    let snapshots = submit_from_threads(&tracker, |_, _| record("racing"));

    let total = THREADS * SUBMISSIONS_PER_THREAD;
    assert_eq!(tracker.history_len(), total as u64);

    // Every call observed a distinct count: one increment per call, none
    // double-counted, none lost.
    let counts: HashSet<u64> = snapshots.iter().map(|s| s.thought_history_length).collect();
    assert_eq!(counts.len(), total);
    assert!(counts.contains(&1));
    assert!(counts.contains(&(total as u64)));
}

#[test]
fn test_concurrent_registration_of_same_branch() {
    let tracker = Arc::new(ThoughtTracker::default());
    let snapshots = submit_from_threads(&tracker, |_, _| ThoughtRecord {
        branch_from_thought: Some(1),
        branch_id: Some("shared".to_string()),
        ..record("same branch everywhere")
    });

    assert_eq!(tracker.branches(), vec!["shared".to_string()]);
    for snapshot in &snapshots {
        assert_eq!(snapshot.branches, vec!["shared".to_string()]);
    }
    assert_eq!(
        tracker.history_len(),
        (THREADS * SUBMISSIONS_PER_THREAD) as u64
    );
}

#[test]
fn test_snapshots_are_internally_consistent() {
    let tracker = Arc::new(ThoughtTracker::default());

    // Each thread registers its own branch on its first submission, so
    // branch registrations race with plain submissions.
    let mut snapshots = submit_from_threads(&tracker, |t, i| {
        if i == 0 {
            ThoughtRecord {
                branch_from_thought: Some(1),
                branch_id: Some(format!("thread-{t}")),
                ..record("register")
            }
        } else {
            record("plain")
        }
    });

    // Branch membership only grows, and each snapshot is taken in the same
    // critical section as its count. Ordering snapshots by count must
    // therefore order branch sets by inclusion - a torn read would break
    // this.
    snapshots.sort_by_key(|s| s.thought_history_length);
    for pair in snapshots.windows(2) {
        let earlier: HashSet<&String> = pair[0].branches.iter().collect();
        let later: HashSet<&String> = pair[1].branches.iter().collect();
        assert!(
            earlier.is_subset(&later),
            "snapshot at count {} saw branches missing at count {}",
            pair[0].thought_history_length,
            pair[1].thought_history_length
        );
    }

    // All branches end up registered exactly once, in sorted order.
    let branches = tracker.branches();
    assert_eq!(branches.len(), THREADS);
    assert!(branches.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_sorted_branches_under_concurrent_distinct_ids() {
    let tracker = Arc::new(ThoughtTracker::default());
    submit_from_threads(&tracker, |t, i| ThoughtRecord {
        branch_from_thought: Some(1),
        branch_id: Some(format!("b{:02}-{:02}", t, i)),
        ..record("unique branch per call")
    });

    let branches = tracker.branches();
    assert_eq!(branches.len(), THREADS * SUBMISSIONS_PER_THREAD);
    assert!(branches.windows(2).all(|w| w[0] < w[1]));
}
