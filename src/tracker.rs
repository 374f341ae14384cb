//! The thought-tracking state machine.
//!
//! [`ThoughtTracker`] owns all mutable server state: the count of accepted
//! thoughts and the set of known branch identifiers. It is a monotonic
//! accumulator. History only grows, and a branch identifier, once
//! registered, is never removed.

use crate::models::{ThoughtRecord, ThoughtSnapshot};
use crate::rendering::ThoughtLog;
use crate::{Error, Result};
use std::sync::{Mutex, PoisonError};

/// Tracks submitted thoughts and named reasoning branches.
///
/// A single instance is shared by all concurrent tool invocations. Both
/// pieces of shared state live behind one mutex so every submission is
/// observed as a single atomic unit: the branch list and history count in a
/// returned snapshot always belong to the same instant.
///
/// Construct one explicitly and pass it where it is needed; there is no
/// process-wide singleton.
pub struct ThoughtTracker {
    state: Mutex<TrackerState>,
    log: ThoughtLog,
}

#[derive(Default)]
struct TrackerState {
    /// Count of accepted thoughts. Only ever incremented.
    history_len: u64,
    /// Known branch identifiers, sorted ascending, no duplicates.
    branch_keys: Vec<String>,
}

impl ThoughtTracker {
    /// Creates a tracker with the given diagnostic sink.
    ///
    /// The sink is fixed for the tracker's lifetime; pass
    /// [`ThoughtLog::disabled`] to turn rendering off.
    #[must_use]
    pub const fn new(log: ThoughtLog) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                history_len: 0,
                branch_keys: Vec::new(),
            }),
            log,
        }
    }

    /// Validates and records one thought, returning a state snapshot.
    ///
    /// Validation happens before any mutation; a failed call leaves the
    /// tracker untouched. When the caller's total estimate lags behind the
    /// step number, the total is raised to match (never lowered, never
    /// rejected).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `thought` is empty, or when
    /// `thoughtNumber` or `totalThoughts` is not positive. These are the
    /// only failures `submit` can produce.
    pub fn submit(&self, record: &ThoughtRecord) -> Result<ThoughtSnapshot> {
        validate(record)?;

        let total_thoughts = record.total_thoughts.max(record.thought_number);

        let (branches, history_len) = {
            let mut state = self.lock_state();

            state.history_len += 1;

            if let Some(id) = record.branch_registration() {
                if let Err(pos) = state.branch_keys.binary_search_by(|k| k.as_str().cmp(id)) {
                    state.branch_keys.insert(pos, id.to_owned());
                }
            }

            // Snapshot under the lock: the branch list and count must come
            // from the same instant.
            (state.branch_keys.clone(), state.history_len)
        };

        // Diagnostic I/O stays outside the critical section.
        self.log.record(record, total_thoughts);

        Ok(ThoughtSnapshot {
            thought_number: record.thought_number,
            total_thoughts,
            next_thought_needed: record.next_thought_needed,
            branches,
            thought_history_length: history_len,
        })
    }

    /// Count of all thoughts ever accepted.
    #[must_use]
    pub fn history_len(&self) -> u64 {
        self.lock_state().history_len
    }

    /// Known branch identifiers, sorted ascending.
    #[must_use]
    pub fn branches(&self) -> Vec<String> {
        self.lock_state().branch_keys.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        // A panicked holder cannot leave the state partially mutated: the
        // only writes are a counter bump and a completed Vec insert.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ThoughtTracker {
    fn default() -> Self {
        Self::new(ThoughtLog::disabled())
    }
}

fn validate(record: &ThoughtRecord) -> Result<()> {
    if record.thought.is_empty() {
        return Err(Error::InvalidInput(
            "thought must be a non-empty string".to_string(),
        ));
    }
    if record.thought_number <= 0 {
        return Err(Error::InvalidInput(
            "thoughtNumber must be a number > 0".to_string(),
        ));
    }
    if record.total_thoughts <= 0 {
        return Err(Error::InvalidInput(
            "totalThoughts must be a number > 0".to_string(),
        ));
    }
    Ok(())
}
