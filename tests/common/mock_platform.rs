//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crowdmerge::error::{Error, Result};
use crowdmerge::platform::{PlatformFactory, PlatformService};
use crowdmerge::registry::RepositoryRegistration;
use crowdmerge::types::{
    CommitStatus, ContributorStat, IssueResetEvents, MergeMethod, MergeOutcome,
    PullRequestSnapshot, RepoHandle, ReviewEvent,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Call record for `create_status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStatusCall {
    pub sha: String,
    pub status: CommitStatus,
}

/// Call record for `create_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub number: u64,
    pub body: String,
}

/// Call record for `merge_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCall {
    pub number: u64,
    pub method: MergeMethod,
}

/// Simple mock platform service for testing
///
/// This manually implements `PlatformService` rather than using a mocking
/// crate, because the trait returns references (`repo()`).
///
/// Features:
/// - Configurable responses per pull request / branch
/// - Published statuses feed back into `list_statuses`, so idempotent
///   publishing can be exercised end to end
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    repo: RepoHandle,
    pull_responses: Mutex<HashMap<u64, PullRequestSnapshot>>,
    open_pulls: Mutex<Vec<PullRequestSnapshot>>,
    review_responses: Mutex<HashMap<u64, Vec<ReviewEvent>>>,
    stats_response: Mutex<Vec<ContributorStat>>,
    commit_date_responses: Mutex<HashMap<u64, DateTime<Utc>>>,
    commit_sha_responses: Mutex<HashMap<u64, String>>,
    reset_event_responses: Mutex<HashMap<u64, IssueResetEvents>>,
    branch_push_responses: Mutex<HashMap<String, DateTime<Utc>>>,
    published_statuses: Mutex<HashMap<String, Vec<CommitStatus>>>,
    config_response: Mutex<Option<String>>,
    merge_responses: Mutex<HashMap<u64, MergeOutcome>>,
    // Call tracking
    create_status_calls: Mutex<Vec<CreateStatusCall>>,
    create_comment_calls: Mutex<Vec<CreateCommentCall>>,
    merge_calls: Mutex<Vec<MergeCall>>,
    // Error injection
    error_on_stats: Mutex<Option<String>>,
    error_on_reviews: Mutex<Option<String>>,
    error_on_events: Mutex<Option<String>>,
    error_on_pull: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock scoped to `owner/repo`.
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            repo: RepoHandle {
                owner: owner.to_string(),
                repo: repo.to_string(),
            },
            pull_responses: Mutex::new(HashMap::new()),
            open_pulls: Mutex::new(Vec::new()),
            review_responses: Mutex::new(HashMap::new()),
            stats_response: Mutex::new(Vec::new()),
            commit_date_responses: Mutex::new(HashMap::new()),
            commit_sha_responses: Mutex::new(HashMap::new()),
            reset_event_responses: Mutex::new(HashMap::new()),
            branch_push_responses: Mutex::new(HashMap::new()),
            published_statuses: Mutex::new(HashMap::new()),
            config_response: Mutex::new(None),
            merge_responses: Mutex::new(HashMap::new()),
            create_status_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            error_on_stats: Mutex::new(None),
            error_on_reviews: Mutex::new(None),
            error_on_events: Mutex::new(None),
            error_on_pull: Mutex::new(None),
        }
    }

    // === Response configuration ===

    /// Register a pull request snapshot (also appears in the open list).
    pub fn set_pull(&self, snapshot: PullRequestSnapshot) {
        self.open_pulls.lock().unwrap().push(snapshot.clone());
        self.pull_responses
            .lock()
            .unwrap()
            .insert(snapshot.number, snapshot);
    }

    /// Set the review list for a pull request.
    pub fn set_reviews(&self, number: u64, reviews: Vec<ReviewEvent>) {
        self.review_responses.lock().unwrap().insert(number, reviews);
    }

    /// Set the contributor statistics for the repository.
    pub fn set_stats(&self, stats: Vec<ContributorStat>) {
        *self.stats_response.lock().unwrap() = stats;
    }

    /// Set the latest commit date for a pull request.
    pub fn set_commit_date(&self, number: u64, date: DateTime<Utc>) {
        self.commit_date_responses.lock().unwrap().insert(number, date);
    }

    /// Set the latest commit SHA for a pull request (defaults to `sha-{n}`).
    pub fn set_commit_sha(&self, number: u64, sha: &str) {
        self.commit_sha_responses
            .lock()
            .unwrap()
            .insert(number, sha.to_string());
    }

    /// Set the countdown-reset issue events for a pull request.
    pub fn set_reset_events(&self, number: u64, events: IssueResetEvents) {
        self.reset_event_responses.lock().unwrap().insert(number, events);
    }

    /// Set the latest push instant for a branch.
    pub fn set_branch_push(&self, head_ref: &str, date: DateTime<Utc>) {
        self.branch_push_responses
            .lock()
            .unwrap()
            .insert(head_ref.to_string(), date);
    }

    /// Set the `.crowdmerge.ini` content.
    pub fn set_config_file(&self, content: &str) {
        *self.config_response.lock().unwrap() = Some(content.to_string());
    }

    /// Pre-seed an already-published status on a commit.
    pub fn seed_status(&self, sha: &str, status: CommitStatus) {
        self.published_statuses
            .lock()
            .unwrap()
            .entry(sha.to_string())
            .or_default()
            .push(status);
    }

    /// Set the outcome of a merge attempt.
    pub fn set_merge_outcome(&self, number: u64, outcome: MergeOutcome) {
        self.merge_responses.lock().unwrap().insert(number, outcome);
    }

    // === Error injection ===

    /// Make `contributor_stats` return an error.
    pub fn fail_stats(&self, msg: &str) {
        *self.error_on_stats.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_reviews` return an error.
    pub fn fail_reviews(&self, msg: &str) {
        *self.error_on_reviews.lock().unwrap() = Some(msg.to_string());
    }

    /// Make the event-history endpoints return errors.
    pub fn fail_events(&self, msg: &str) {
        *self.error_on_events.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `pull_request` return an error.
    pub fn fail_pull(&self, msg: &str) {
        *self.error_on_pull.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification ===

    /// All `create_status` calls.
    pub fn status_calls(&self) -> Vec<CreateStatusCall> {
        self.create_status_calls.lock().unwrap().clone()
    }

    /// All `create_comment` calls.
    pub fn comment_calls(&self) -> Vec<CreateCommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    /// All `merge_pull_request` calls.
    pub fn merge_calls(&self) -> Vec<MergeCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Assert that a merge was attempted for a pull request.
    pub fn assert_merge_called(&self, number: u64) {
        let calls = self.merge_calls();
        assert!(
            calls.iter().any(|c| c.number == number),
            "Expected merge_pull_request({number}) but got: {calls:?}"
        );
    }

    /// Assert that no merge was attempted for a pull request.
    pub fn assert_merge_not_called(&self, number: u64) {
        let calls = self.merge_calls();
        assert!(
            !calls.iter().any(|c| c.number == number),
            "Expected merge_pull_request({number}) NOT to be called but it was: {calls:?}"
        );
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn pull_request(&self, number: u64) -> Result<PullRequestSnapshot> {
        if let Some(msg) = self.error_on_pull.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        self.pull_responses
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| {
                Error::Platform(format!("pull_request: no response configured for #{number}"))
            })
    }

    async fn open_pull_requests(&self) -> Result<Vec<PullRequestSnapshot>> {
        Ok(self.open_pulls.lock().unwrap().clone())
    }

    async fn list_reviews(&self, number: u64) -> Result<Vec<ReviewEvent>> {
        if let Some(msg) = self.error_on_reviews.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self
            .review_responses
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn contributor_stats(&self) -> Result<Vec<ContributorStat>> {
        if let Some(msg) = self.error_on_stats.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self.stats_response.lock().unwrap().clone())
    }

    async fn latest_commit_date(&self, number: u64) -> Result<Option<DateTime<Utc>>> {
        if let Some(msg) = self.error_on_events.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self.commit_date_responses.lock().unwrap().get(&number).copied())
    }

    async fn latest_commit_sha(&self, number: u64) -> Result<String> {
        Ok(self
            .commit_sha_responses
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_else(|| format!("sha-{number}")))
    }

    async fn issue_reset_events(&self, number: u64) -> Result<IssueResetEvents> {
        if let Some(msg) = self.error_on_events.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self
            .reset_event_responses
            .lock()
            .unwrap()
            .get(&number)
            .copied()
            .unwrap_or_default())
    }

    async fn latest_branch_push(&self, head_ref: &str) -> Result<Option<DateTime<Utc>>> {
        if let Some(msg) = self.error_on_events.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }
        Ok(self.branch_push_responses.lock().unwrap().get(head_ref).copied())
    }

    async fn list_statuses(&self, sha: &str, context: &str) -> Result<Vec<CommitStatus>> {
        Ok(self
            .published_statuses
            .lock()
            .unwrap()
            .get(sha)
            .map(|statuses| {
                statuses
                    .iter()
                    .filter(|s| s.context == context)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_status(&self, sha: &str, status: &CommitStatus) -> Result<()> {
        self.create_status_calls.lock().unwrap().push(CreateStatusCall {
            sha: sha.to_string(),
            status: status.clone(),
        });
        self.published_statuses
            .lock()
            .unwrap()
            .entry(sha.to_string())
            .or_default()
            .push(status.clone());
        Ok(())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        self.create_comment_calls.lock().unwrap().push(CreateCommentCall {
            number,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn merge_pull_request(&self, number: u64, method: MergeMethod) -> Result<MergeOutcome> {
        self.merge_calls.lock().unwrap().push(MergeCall { number, method });
        Ok(self
            .merge_responses
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or(MergeOutcome::Merged { sha: None }))
    }

    async fn config_file(&self) -> Result<Option<String>> {
        Ok(self.config_response.lock().unwrap().clone())
    }

    fn repo(&self) -> &RepoHandle {
        &self.repo
    }
}

/// Factory handing out pre-built mocks by repository full name
#[derive(Default)]
pub struct MockPlatformFactory {
    services: Mutex<HashMap<String, Arc<MockPlatformService>>>,
}

impl MockPlatformFactory {
    /// Register a mock service for a repository.
    pub fn insert(&self, full_name: &str, service: Arc<MockPlatformService>) {
        self.services
            .lock()
            .unwrap()
            .insert(full_name.to_string(), service);
    }
}

impl PlatformFactory for MockPlatformFactory {
    fn create(&self, registration: &RepositoryRegistration) -> Result<Arc<dyn PlatformService>> {
        self.services
            .lock()
            .unwrap()
            .get(&registration.full_name)
            .cloned()
            .map(|service| service as Arc<dyn PlatformService>)
            .ok_or_else(|| {
                Error::Platform(format!(
                    "no mock service configured for {}",
                    registration.full_name
                ))
            })
    }
}
