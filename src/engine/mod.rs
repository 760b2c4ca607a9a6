//! The merge-decision engine
//!
//! A pure pipeline of value objects: ledger → votes → timeline → schedule.
//! Each stage takes the previous stage's output and produces a new value;
//! nothing is cached between evaluations, so the derived state can never
//! drift from the authoritative remote state.

mod ledger;
mod schedule;
mod timeline;
mod votes;

pub use ledger::Ledger;
pub use schedule::schedule;
pub use timeline::resolve_start;
pub use votes::tally;

use crate::config::{self, RepoConfig};
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{
    IssueResetEvents, MergeDecision, PullRequestSnapshot, ReviewEvent, TimelineCandidates,
    VoteResult,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// The complete result of evaluating one pull request
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// The pull request as seen at evaluation time
    pub snapshot: PullRequestSnapshot,
    /// Configuration in effect for this evaluation
    pub config: RepoConfig,
    /// The contribution ledger after review aggregation
    pub ledger: Ledger,
    /// Weighted vote tallies
    pub vote: VoteResult,
    /// Countdown start instant
    pub timeline_start: DateTime<Utc>,
    /// The scheduling decision
    pub decision: MergeDecision,
}

/// Evaluate a pull request from authoritative remote state.
pub async fn evaluate(platform: &dyn PlatformService, number: u64) -> Result<Evaluation> {
    evaluate_with_review(platform, number, None).await
}

/// Evaluate a pull request, folding in one review that just arrived via
/// webhook (it may not yet show up in the provider's review list).
///
/// Required inputs (snapshot, reviews) propagate failures; optional inputs
/// (stats, commit dates, event history) degrade to empty so a missing
/// feed only weakens the evaluation instead of aborting it.
pub async fn evaluate_with_review(
    platform: &dyn PlatformService,
    number: u64,
    incoming: Option<&ReviewEvent>,
) -> Result<Evaluation> {
    let snapshot = platform.pull_request(number).await?;
    let config = config::load(platform).await;

    let stats = match platform.contributor_stats().await {
        Ok(stats) => stats,
        Err(e) => {
            warn!(number, error = %e, "contributor stats unavailable, using empty ledger");
            Vec::new()
        }
    };
    let reviews = platform.list_reviews(number).await?;

    let mut ledger =
        Ledger::from_stats(&stats, &snapshot.author_login).with_reviews(&reviews, &snapshot.author_login);
    if let Some(review) = incoming {
        ledger = ledger.with_review(review, &snapshot.author_login);
    }
    let vote = tally(&ledger);

    let latest_commit = platform
        .latest_commit_date(number)
        .await
        .unwrap_or_else(|e| {
            warn!(number, error = %e, "commit dates unavailable");
            None
        });
    let latest_push = platform
        .latest_branch_push(&snapshot.head_ref)
        .await
        .unwrap_or_else(|e| {
            warn!(number, error = %e, "push event history unavailable");
            None
        });
    let resets = platform
        .issue_reset_events(number)
        .await
        .unwrap_or_else(|e| {
            warn!(number, error = %e, "issue event history unavailable");
            IssueResetEvents::default()
        });

    let candidates = TimelineCandidates {
        created_at: snapshot.created_at,
        latest_commit,
        latest_push,
        wip_removed: resets.wip_label_removed,
        ready_for_review: resets.ready_for_review,
    };
    let timeline_start = resolve_start(&candidates);

    let decision = schedule(
        vote,
        snapshot.commit_count,
        &config,
        timeline_start,
        Utc::now(),
    );

    debug!(
        number,
        coefficient = vote.coefficient,
        votes = vote.votes,
        votes_total = vote.votes_total,
        eligible_at = ?decision.eligible_at,
        now_eligible = decision.now_eligible,
        "evaluated pull request"
    );

    Ok(Evaluation {
        snapshot,
        config,
        ledger,
        vote,
        timeline_start,
        decision,
    })
}
