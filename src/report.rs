//! Decision reporting - status checks and conversation comments
//!
//! Statuses are published idempotently: if the latest commit already
//! carries a status with the same description under our context, nothing
//! is written, so repeated sweeps with an unchanged decision add no noise
//! to the status history. Comments are reserved for meaningful
//! transitions; the sweep itself never comments except after a merge.

use crate::engine::Evaluation;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::CommitStatus;
use tracing::debug;

/// Context identifier for all statuses this system publishes.
pub const STATUS_CONTEXT: &str = "crowdmerge";

/// Publishes decisions to the pull request
pub struct Reporter<'a> {
    platform: &'a dyn PlatformService,
    base_url: &'a str,
}

impl<'a> Reporter<'a> {
    /// Create a reporter for one platform and dashboard base URL.
    pub const fn new(platform: &'a dyn PlatformService, base_url: &'a str) -> Self {
        Self { platform, base_url }
    }

    /// Dashboard URL for a pull request.
    fn dashboard_url(&self, number: u64) -> String {
        let repo = self.platform.repo();
        format!("{}/{}/{}/pull/{number}", self.base_url, repo.owner, repo.repo)
    }

    /// Publish the decision as a commit status on the latest commit,
    /// skipping the write when an identical status already exists.
    pub async fn publish_status(&self, evaluation: &Evaluation) -> Result<()> {
        let number = evaluation.snapshot.number;
        let sha = self.platform.latest_commit_sha(number).await?;

        let status = CommitStatus {
            state: evaluation.decision.status_state,
            description: evaluation.decision.status_description.clone(),
            target_url: self.dashboard_url(number),
            context: STATUS_CONTEXT.to_string(),
        };

        let existing = self.platform.list_statuses(&sha, STATUS_CONTEXT).await?;
        if existing.iter().any(|s| s.description == status.description) {
            debug!(number, "status unchanged, skipping publish");
            return Ok(());
        }

        self.platform.create_status(&sha, &status).await
    }

    /// Post a comment on the pull request conversation.
    pub async fn comment(&self, number: u64, body: &str) -> Result<()> {
        self.platform.create_comment(number, body).await
    }

    /// Comment posted when a pull request is opened.
    pub fn opened_comment(&self, evaluation: &Evaluation) -> String {
        let url = self.dashboard_url(evaluation.snapshot.number);
        if evaluation.decision.is_blocked() {
            return format!(
                "The weighted vote on this pull request is negative, so it will not \
                 be merged automatically.\n\
                 Check the `{STATUS_CONTEXT}` status check or the [dashboard]({url}) for current stats.\n\n\
                 To speed up or delay the merge, review the pull request:\n\
                 - Speed up: approve\n\
                 - Delay or stop: request changes"
            );
        }

        let days = evaluation.decision.days_remaining();
        #[allow(clippy::cast_precision_loss)]
        let total_days = evaluation.decision.total_merge_duration.num_hours() as f64 / 24.0;
        format!(
            "This pull request will be automatically merged by crowdmerge in {days} day(s).\n\
             The start date is based on the latest commit date / pull request created date / (force) push date.\n\
             The time to merge is {total_days:.1} days.\n\
             Check the `{STATUS_CONTEXT}` status check or the [dashboard]({url}) for current stats.\n\n\
             To speed up or delay the merge, review the pull request:\n\
             - Speed up: approve\n\
             - Delay or stop: request changes"
        )
    }

    /// Comment posted when the branch receives new commits.
    pub fn synchronize_comment(&self, evaluation: &Evaluation) -> String {
        let url = self.dashboard_url(evaluation.snapshot.number);
        if evaluation.decision.is_blocked() {
            return format!(
                "The branch of this pull request was updated.\n\n\
                 The weighted vote is negative, so it will not be merged automatically.\n\
                 Check the `{STATUS_CONTEXT}` status check or the [dashboard]({url}) for current stats."
            );
        }

        let days = evaluation.decision.days_remaining();
        format!(
            "The branch of this pull request was updated so the auto-merge countdown has been reset.\n\n\
             It will be automatically merged by crowdmerge in {days} day(s).\n\
             Check the `{STATUS_CONTEXT}` status check or the [dashboard]({url}) for current stats."
        )
    }

    /// Comment posted when a review is recorded.
    pub fn review_comment(&self, evaluation: &Evaluation) -> String {
        let days = evaluation.decision.days_remaining();
        let vote = &evaluation.vote;
        if evaluation.decision.is_blocked() {
            format!(
                "Thank you for the review.\n\
                 Current votes: {}/{}. The weighted vote is negative, so this pull request \
                 will not be merged automatically.\n\n\
                 Check the `{STATUS_CONTEXT}` status check or the [dashboard]({}) for current stats.",
                vote.votes,
                vote.votes_total,
                self.dashboard_url(evaluation.snapshot.number)
            )
        } else {
            format!(
                "Thank you for the review.\n\
                 This pull request will be automatically merged by crowdmerge in {days} day(s). \
                 Current votes: {}/{}.\n\n\
                 Check the `{STATUS_CONTEXT}` status check or the [dashboard]({}) for current stats.",
                vote.votes,
                vote.votes_total,
                self.dashboard_url(evaluation.snapshot.number)
            )
        }
    }

    /// Comment posted after a successful automatic merge.
    pub fn merged_comment(&self) -> String {
        "This pull request was merged by crowdmerge.".to_string()
    }
}
