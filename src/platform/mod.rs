//! Platform services for the source-control provider
//!
//! Provides the narrow interface the decision engine consumes: everything
//! else (pagination, auth headers, endpoint quirks) stays behind this trait.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::registry::RepositoryRegistration;
use crate::types::{
    CommitStatus, ContributorStat, IssueResetEvents, MergeMethod, MergeOutcome,
    PullRequestSnapshot, RepoHandle, ReviewEvent,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Platform service trait for one repository
///
/// Every evaluation works exclusively through this trait, which makes the
/// whole pipeline testable against a mock. Implementations are scoped to a
/// single repository with a single credential.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Fetch a snapshot of one pull request
    async fn pull_request(&self, number: u64) -> Result<PullRequestSnapshot>;

    /// List all open pull requests in the repository
    async fn open_pull_requests(&self) -> Result<Vec<PullRequestSnapshot>>;

    /// List reviews for a pull request.
    ///
    /// A 404 from the provider means no reviews exist and must be returned
    /// as an empty list, not an error.
    async fn list_reviews(&self, number: u64) -> Result<Vec<ReviewEvent>>;

    /// Per-author all-time commit counts for the repository.
    ///
    /// The provider may still be computing the statistics; that is returned
    /// as an empty list, not an error.
    async fn contributor_stats(&self) -> Result<Vec<ContributorStat>>;

    /// Latest commit date on a pull request (max of author/committer date
    /// across all commits; committer date is later after a force-push)
    async fn latest_commit_date(&self, number: u64) -> Result<Option<DateTime<Utc>>>;

    /// SHA of the most recent commit on a pull request
    async fn latest_commit_sha(&self, number: u64) -> Result<String>;

    /// Countdown-resetting issue events (WIP unlabel, ready-for-review)
    async fn issue_reset_events(&self, number: u64) -> Result<IssueResetEvents>;

    /// Latest push event to the given head branch, if any
    async fn latest_branch_push(&self, head_ref: &str) -> Result<Option<DateTime<Utc>>>;

    /// List statuses already published on a commit under the given context
    async fn list_statuses(&self, sha: &str, context: &str) -> Result<Vec<CommitStatus>>;

    /// Publish a commit status
    async fn create_status(&self, sha: &str, status: &CommitStatus) -> Result<()>;

    /// Post a comment on a pull request's conversation
    async fn create_comment(&self, number: u64, body: &str) -> Result<()>;

    /// Merge a pull request.
    ///
    /// Provider-side rejections (conflicts, branch-protection rules) are
    /// reported as `MergeOutcome::Conflict`/`ProviderError`, never as `Err`.
    async fn merge_pull_request(&self, number: u64, method: MergeMethod) -> Result<MergeOutcome>;

    /// Raw content of the in-repository configuration file, if present
    async fn config_file(&self) -> Result<Option<String>>;

    /// The repository this service is scoped to
    fn repo(&self) -> &RepoHandle;
}

/// Creates platform services from registration records
///
/// The webhook handler and the sweep both construct a service per
/// registered repository; factoring this behind a trait lets tests inject
/// mock services.
pub trait PlatformFactory: Send + Sync {
    /// Build a service for the registered repository.
    fn create(&self, registration: &RepositoryRegistration) -> Result<Arc<dyn PlatformService>>;
}

/// Factory producing real [`GitHubService`] instances
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubFactory;

impl PlatformFactory for GitHubFactory {
    fn create(&self, registration: &RepositoryRegistration) -> Result<Arc<dyn PlatformService>> {
        let handle = registration.handle()?;
        let service = GitHubService::new(&registration.token, handle)?;
        Ok(Arc::new(service))
    }
}
