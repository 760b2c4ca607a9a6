//! Periodic reconciliation sweep
//!
//! Re-evaluates every registered repository's open pull requests on a
//! fixed interval, independent of webhooks. This is what performs merges
//! once time has elapsed and what recovers from missed webhook deliveries.
//! The sweep publishes statuses only; conversational comments are reserved
//! for the webhook transitions (plus a short note after a merge).

use crate::engine::{self, Evaluation};
use crate::error::Result;
use crate::platform::{PlatformFactory, PlatformService};
use crate::registry::RegistrationStore;
use crate::report::Reporter;
use crate::types::MergeOutcome;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Totals for one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Pull requests evaluated
    pub processed: usize,
    /// Pull requests merged
    pub merged: usize,
    /// Pull requests that failed to evaluate or act
    pub errors: usize,
}

/// Attempt the merge if the decision says the time has come.
///
/// Returns `None` when the pull request is not (yet) eligible, is a draft
/// or `[WIP]`, or the provider reports it unmergeable. Conflicts and
/// provider rejections come back as outcomes, not errors, so one stuck
/// pull request never aborts the caller's loop.
pub async fn merge_if_eligible(
    platform: &dyn PlatformService,
    reporter: &Reporter<'_>,
    evaluation: &Evaluation,
) -> Result<Option<MergeOutcome>> {
    if !evaluation.decision.now_eligible {
        return Ok(None);
    }

    // Webhooks fire for drafts too; a draft or conflicted pull request
    // never merges, no matter the vote.
    if evaluation.snapshot.is_draft_or_wip() || evaluation.snapshot.mergeable == Some(false) {
        debug!(number = evaluation.snapshot.number, "draft or unmergeable, skipping merge");
        return Ok(None);
    }

    let number = evaluation.snapshot.number;
    let outcome = platform
        .merge_pull_request(number, evaluation.config.merge_method)
        .await?;

    match &outcome {
        MergeOutcome::Merged { sha } => {
            info!(number, sha = ?sha, "merged pull request");
            reporter.comment(number, &reporter.merged_comment()).await?;
        }
        MergeOutcome::Conflict(message) => {
            warn!(number, message, "merge rejected by provider");
        }
        MergeOutcome::ProviderError(message) => {
            warn!(number, message, "merge attempt failed");
        }
    }

    Ok(Some(outcome))
}

/// Evaluate one pull request, publish its status, and merge if eligible.
async fn process_pull_request(
    platform: &dyn PlatformService,
    reporter: &Reporter<'_>,
    number: u64,
) -> Result<Option<MergeOutcome>> {
    let evaluation = engine::evaluate(platform, number).await?;
    reporter.publish_status(&evaluation).await?;
    merge_if_eligible(platform, reporter, &evaluation).await
}

/// Run one sweep pass over all registered repositories.
pub async fn sweep_once(
    registry: &dyn RegistrationStore,
    factory: &dyn PlatformFactory,
    base_url: &str,
) -> SweepSummary {
    let mut summary = SweepSummary::default();

    let registrations = match registry.list().await {
        Ok(registrations) => registrations,
        Err(e) => {
            error!(error = %e, "failed to list registrations, skipping sweep");
            summary.errors += 1;
            return summary;
        }
    };

    info!(repositories = registrations.len(), "starting sweep");

    for registration in &registrations {
        let platform = match factory.create(registration) {
            Ok(platform) => platform,
            Err(e) => {
                error!(repository = %registration.full_name, error = %e, "failed to create platform service");
                summary.errors += 1;
                continue;
            }
        };

        let pulls = match platform.open_pull_requests().await {
            Ok(pulls) => pulls,
            Err(e) => {
                error!(repository = %registration.full_name, error = %e, "failed to list pull requests");
                summary.errors += 1;
                continue;
            }
        };

        let reporter = Reporter::new(platform.as_ref(), base_url);

        for pull in &pulls {
            if pull.is_draft_or_wip() || pull.mergeable == Some(false) {
                continue;
            }

            match process_pull_request(platform.as_ref(), &reporter, pull.number).await {
                Ok(outcome) => {
                    summary.processed += 1;
                    if outcome.is_some_and(|o| o.is_merged()) {
                        summary.merged += 1;
                    }
                }
                // One failing pull request never aborts the sweep
                Err(e) => {
                    error!(
                        repository = %registration.full_name,
                        number = pull.number,
                        error = %e,
                        "failed to process pull request"
                    );
                    summary.errors += 1;
                }
            }
        }
    }

    info!(
        processed = summary.processed,
        merged = summary.merged,
        errors = summary.errors,
        "sweep complete"
    );
    summary
}

/// Run the sweep forever on a fixed interval.
pub async fn run(
    registry: Arc<dyn RegistrationStore>,
    factory: Arc<dyn PlatformFactory>,
    base_url: String,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        sweep_once(registry.as_ref(), factory.as_ref(), &base_url).await;
    }
}
