//! Wire-level data types for the `sequentialthinking` tool.
//!
//! Field names mirror the tool's published JSON schema (camelCase). The
//! record type is what callers submit; the snapshot type is what the server
//! returns after each accepted submission.

use serde::{Deserialize, Serialize};

/// One step in an iterative reasoning sequence, as submitted by a caller.
///
/// Only the required fields (`thought`, `nextThoughtNeeded`, `thoughtNumber`,
/// `totalThoughts`) must be present on the wire; the rest default to
/// absent/false. Step numbers are kept signed so the tracker can re-validate
/// them itself instead of trusting schema-level minimums upstream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThoughtRecord {
    /// The content of this reasoning step.
    pub thought: String,

    /// Whether the caller intends to submit further steps.
    pub next_thought_needed: bool,

    /// This step's sequence position, starting at 1.
    pub thought_number: i64,

    /// The caller's current estimate of total steps.
    pub total_thoughts: i64,

    /// Marks this step as revising an earlier one.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_revision: bool,

    /// Which earlier step is revised. Advisory; not range-checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revises_thought: Option<i64>,

    /// The step this one branches from. Presence marks an explicit branch
    /// point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_from_thought: Option<i64>,

    /// Identifier of the branch this step belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,

    /// Caller signal that more steps than estimated will be needed.
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_more_thoughts: bool,
}

impl ThoughtRecord {
    /// Returns the branch identifier when this record registers a branch.
    ///
    /// A record registers a branch only when the caller names a branching
    /// point (`branchFromThought` is present) *and* supplies a non-empty
    /// `branchId`. Either half missing means no registration, regardless of
    /// the other.
    #[must_use]
    pub fn branch_registration(&self) -> Option<&str> {
        if self.branch_from_thought.is_none() {
            return None;
        }
        self.branch_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Immutable response data reflecting tracker state at the instant a
/// submission's mutation completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtSnapshot {
    /// The step number, possibly normalized.
    pub thought_number: i64,

    /// The total estimate, raised to the step number when it lagged behind.
    pub total_thoughts: i64,

    /// The caller's `nextThoughtNeeded` flag, verbatim.
    pub next_thought_needed: bool,

    /// Known branch identifiers, sorted ascending. Omitted while empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    /// Count of all thoughts ever accepted.
    pub thought_history_length: u64,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde skip_serializing_if signature
const fn is_false(value: &bool) -> bool {
    !*value
}
