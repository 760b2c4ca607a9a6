//! Countdown start resolution - pure functions
//!
//! Any action that puts new code or a new state in front of reviewers
//! (push, force-push, WIP removal, undrafting) restarts the waiting
//! period, so the countdown starts at the latest candidate instant.

use crate::types::TimelineCandidates;
use chrono::{DateTime, Utc};

/// Resolve the authoritative countdown start.
///
/// Absent candidates fall back to the epoch sentinel so they never win
/// over the creation time.
#[must_use]
pub fn resolve_start(candidates: &TimelineCandidates) -> DateTime<Utc> {
    let epoch = DateTime::UNIX_EPOCH;
    candidates
        .created_at
        .max(candidates.latest_commit.unwrap_or(epoch))
        .max(candidates.latest_push.unwrap_or(epoch))
        .max(candidates.wip_removed.unwrap_or(epoch))
        .max(candidates.ready_for_review.unwrap_or(epoch))
}
