//! Merge scheduling - pure functions
//!
//! Answers a snapshot question: given the vote outcome and the countdown
//! start, when may this pull request merge, and is that now? No polling
//! happens here; the scheduler is invoked once per evaluation.

use crate::config::RepoConfig;
use crate::types::{MergeDecision, StatusState, VoteResult};
use chrono::{DateTime, Duration, Utc};

/// Compute the merge decision for one evaluation.
///
/// The waiting period is `(1 - coefficient) × (base + commits × per_commit)`
/// hours from the countdown start; a coefficient of 1 collapses it to zero.
/// A negative coefficient is terminal: the pull request will not be merged
/// no matter how much time passes.
#[must_use]
pub fn schedule(
    vote: VoteResult,
    commit_count: u64,
    config: &RepoConfig,
    timeline_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> MergeDecision {
    let age = now - timeline_start;

    #[allow(clippy::cast_precision_loss)]
    let total_hours = config.base_merge_hours + commit_count as f64 * config.per_commit_hours;
    let total_merge_duration = hours_to_duration(total_hours);

    if vote.coefficient < 0.0 {
        return MergeDecision {
            coefficient: vote.coefficient,
            age,
            total_merge_duration,
            merge_duration: total_merge_duration,
            eligible_at: None,
            now_eligible: false,
            status_state: StatusState::Error,
            status_description: format!("{:.2} Will not merge", vote.coefficient),
        };
    }

    let merge_duration = hours_to_duration((1.0 - vote.coefficient) * total_hours);
    let eligible_at = timeline_start + merge_duration;
    let now_eligible = now >= eligible_at;

    MergeDecision {
        coefficient: vote.coefficient,
        age,
        total_merge_duration,
        merge_duration,
        eligible_at: Some(eligible_at),
        now_eligible,
        status_state: StatusState::Success,
        status_description: format!(
            "{:.2} Merge at {}",
            vote.coefficient,
            eligible_at.format("%Y-%m-%d")
        ),
    }
}

/// Convert fractional hours to a duration with millisecond precision.
fn hours_to_duration(hours: f64) -> Duration {
    #[allow(clippy::cast_possible_truncation)]
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}
