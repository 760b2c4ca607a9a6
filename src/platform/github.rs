//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    CommitStatus, ContributorStat, IssueResetEvents, MergeMethod, MergeOutcome,
    PullRequestSnapshot, RepoHandle, ReviewEvent, ReviewState, StatusState,
};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// GitHub service using octocrab plus raw HTTP for the endpoints octocrab
/// does not model (contributor stats, repo events, commit statuses,
/// contents).
pub struct GitHubService {
    client: Octocrab,
    repo: RepoHandle,
    /// Token for raw HTTP requests
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
}

impl GitHubService {
    /// Create a new GitHub service scoped to one repository.
    pub fn new(token: &str, repo: RepoHandle) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("crowdmerge")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            repo,
            token: token.to_string(),
            http_client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/{path}",
            self.repo.owner, self.repo.repo
        )
    }

    async fn raw_get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;
        Ok(response)
    }

    async fn fetch_pr_commits(&self, number: u64) -> Result<Vec<CommitEntry>> {
        let url = self.api_url(&format!("pulls/{number}/commits?per_page=100"));
        let response = self.raw_get(&url).await?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Failed to fetch commits for PR #{number}: {}",
                response.status()
            )));
        }

        let commits: Vec<CommitEntry> = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse commit list: {e}")))?;
        Ok(commits)
    }
}

// Raw API response types

#[derive(Deserialize)]
struct StatEntry {
    total: u64,
    author: Option<StatAuthor>,
}

#[derive(Deserialize)]
struct StatAuthor {
    login: String,
}

#[derive(Deserialize)]
struct CommitEntry {
    sha: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    author: Option<GitActor>,
    committer: Option<GitActor>,
}

#[derive(Deserialize)]
struct GitActor {
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct IssueEventEntry {
    event: String,
    created_at: Option<DateTime<Utc>>,
    label: Option<LabelRef>,
}

#[derive(Deserialize)]
struct LabelRef {
    name: String,
}

#[derive(Deserialize)]
struct RepoEventEntry {
    #[serde(rename = "type")]
    kind: String,
    created_at: Option<DateTime<Utc>>,
    payload: Option<PushPayload>,
}

#[derive(Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Deserialize)]
struct StatusEntry {
    state: String,
    description: Option<String>,
    context: Option<String>,
    target_url: Option<String>,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: Option<String>,
}

/// Whether an octocrab error is a plain HTTP 404 from GitHub.
fn is_not_found(error: &octocrab::Error) -> bool {
    matches!(error, octocrab::Error::GitHub { source, .. }
        if source.status_code.as_u16() == 404)
}

/// Whether an octocrab error is a merge rejection (conflict or rule
/// violation); GitHub answers 405 or 409 for those.
fn is_merge_rejection(error: &octocrab::Error) -> bool {
    matches!(error, octocrab::Error::GitHub { source, .. }
        if matches!(source.status_code.as_u16(), 405 | 409))
}

/// Helper to convert an octocrab PR to our snapshot type
fn snapshot_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequestSnapshot {
    PullRequestSnapshot {
        number: pr.number,
        author_login: pr
            .user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_default(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        commit_count: pr.commits.unwrap_or(0),
        created_at: pr.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        mergeable: pr.mergeable,
        head_ref: pr.head.ref_field.clone(),
        is_draft: pr.draft.unwrap_or(false),
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn pull_request(&self, number: u64) -> Result<PullRequestSnapshot> {
        debug!(number, "fetching pull request");
        let pr = self
            .client
            .pulls(&self.repo.owner, &self.repo.repo)
            .get(number)
            .await?;
        Ok(snapshot_from_octocrab(&pr))
    }

    async fn open_pull_requests(&self) -> Result<Vec<PullRequestSnapshot>> {
        debug!("listing open pull requests");
        let prs = self
            .client
            .pulls(&self.repo.owner, &self.repo.repo)
            .list()
            .state(octocrab::params::State::Open)
            .per_page(100)
            .send()
            .await?;

        let result: Vec<PullRequestSnapshot> =
            prs.items.iter().map(snapshot_from_octocrab).collect();
        debug!(count = result.len(), "listed open pull requests");
        Ok(result)
    }

    async fn list_reviews(&self, number: u64) -> Result<Vec<ReviewEvent>> {
        debug!(number, "listing reviews");
        let reviews = match self
            .client
            .pulls(&self.repo.owner, &self.repo.repo)
            .list_reviews(number)
            .send()
            .await
        {
            Ok(page) => page.items,
            // No reviews at all is reported as a 404 by some API versions
            Err(e) if is_not_found(&e) => {
                debug!(number, "review list 404, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let result = reviews
            .into_iter()
            .filter_map(|review| {
                let state = match review.state? {
                    octocrab::models::pulls::ReviewState::Approved => ReviewState::Approved,
                    octocrab::models::pulls::ReviewState::ChangesRequested => {
                        ReviewState::ChangesRequested
                    }
                    octocrab::models::pulls::ReviewState::Commented => ReviewState::Commented,
                    _ => return None,
                };
                Some(ReviewEvent {
                    reviewer_login: review.user?.login,
                    state,
                    submitted_at: review.submitted_at?,
                })
            })
            .collect();
        Ok(result)
    }

    async fn contributor_stats(&self) -> Result<Vec<ContributorStat>> {
        let url = self.api_url("stats/contributors");
        let response = self.raw_get(&url).await?;

        // 202 means GitHub is still computing the statistics; an empty
        // ledger is a recoverable state, not an error.
        if response.status().as_u16() == 202 || !response.status().is_success() {
            debug!(status = %response.status(), "contributor stats unavailable");
            return Ok(Vec::new());
        }

        let stats: Vec<StatEntry> = response.json().await.unwrap_or_default();
        let result = stats
            .into_iter()
            .filter_map(|entry| {
                entry.author.map(|author| ContributorStat {
                    login: author.login,
                    total_commits: entry.total,
                })
            })
            .collect();
        Ok(result)
    }

    async fn latest_commit_date(&self, number: u64) -> Result<Option<DateTime<Utc>>> {
        let commits = self.fetch_pr_commits(number).await?;

        let latest = commits
            .iter()
            .filter_map(|entry| {
                // After a force-push the committer date is more recent than
                // the author date; take the later of the two.
                let author = entry.commit.author.as_ref().and_then(|a| a.date);
                let committer = entry.commit.committer.as_ref().and_then(|c| c.date);
                author.into_iter().chain(committer).max()
            })
            .max();
        Ok(latest)
    }

    async fn latest_commit_sha(&self, number: u64) -> Result<String> {
        let commits = self.fetch_pr_commits(number).await?;
        commits
            .last()
            .map(|entry| entry.sha.clone())
            .ok_or_else(|| Error::GitHubApi(format!("PR #{number} has no commits")))
    }

    async fn issue_reset_events(&self, number: u64) -> Result<IssueResetEvents> {
        let url = self.api_url(&format!("issues/{number}/events?per_page=100"));
        let response = self.raw_get(&url).await?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Failed to fetch issue events for #{number}: {}",
                response.status()
            )));
        }

        let events: Vec<IssueEventEntry> = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse issue events: {e}")))?;

        let mut result = IssueResetEvents::default();
        for event in &events {
            match event.event.as_str() {
                "unlabeled" if event.label.as_ref().is_some_and(|l| l.name == "WIP") => {
                    result.wip_label_removed = result.wip_label_removed.max(event.created_at);
                }
                "ready_for_review" => {
                    result.ready_for_review = result.ready_for_review.max(event.created_at);
                }
                _ => {}
            }
        }
        Ok(result)
    }

    async fn latest_branch_push(&self, head_ref: &str) -> Result<Option<DateTime<Utc>>> {
        let url = self.api_url("events?per_page=100");
        let response = self.raw_get(&url).await?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Failed to fetch repository events: {}",
                response.status()
            )));
        }

        let events: Vec<RepoEventEntry> = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse repository events: {e}")))?;

        // The events feed covers the whole repository; only pushes to this
        // branch may reset the countdown.
        let branch_ref = format!("refs/heads/{head_ref}");
        let latest = events
            .iter()
            .filter(|event| event.kind == "PushEvent")
            .filter(|event| {
                event
                    .payload
                    .as_ref()
                    .and_then(|p| p.git_ref.as_deref())
                    .is_some_and(|r| r == branch_ref)
            })
            .filter_map(|event| event.created_at)
            .max();
        Ok(latest)
    }

    async fn list_statuses(&self, sha: &str, context: &str) -> Result<Vec<CommitStatus>> {
        let url = self.api_url(&format!("commits/{sha}/statuses?per_page=100"));
        let response = self.raw_get(&url).await?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "status list unavailable, assuming none");
            return Ok(Vec::new());
        }

        let statuses: Vec<StatusEntry> = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse statuses: {e}")))?;

        let result = statuses
            .into_iter()
            .filter(|entry| entry.context.as_deref() == Some(context))
            .filter_map(|entry| {
                let state = match entry.state.as_str() {
                    "success" => StatusState::Success,
                    "error" | "failure" => StatusState::Error,
                    _ => return None,
                };
                Some(CommitStatus {
                    state,
                    description: entry.description.unwrap_or_default(),
                    target_url: entry.target_url.unwrap_or_default(),
                    context: entry.context.unwrap_or_default(),
                })
            })
            .collect();
        Ok(result)
    }

    async fn create_status(&self, sha: &str, status: &CommitStatus) -> Result<()> {
        debug!(sha, state = %status.state, "publishing commit status");
        let url = self.api_url(&format!("statuses/{sha}"));
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&serde_json::json!({
                "state": status.state.to_string(),
                "target_url": status.target_url,
                "description": status.description,
                "context": status.context,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Failed to create status: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        debug!(number, "creating comment");
        self.client
            .issues(&self.repo.owner, &self.repo.repo)
            .create_comment(number, body)
            .await?;
        Ok(())
    }

    async fn merge_pull_request(&self, number: u64, method: MergeMethod) -> Result<MergeOutcome> {
        debug!(number, %method, "merging pull request");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let result = self
            .client
            .pulls(&self.repo.owner, &self.repo.repo)
            .merge(number)
            .method(octocrab_method)
            .send()
            .await;

        let outcome = match result {
            Ok(merge) if merge.merged => MergeOutcome::Merged { sha: merge.sha },
            Ok(merge) => MergeOutcome::Conflict(
                merge
                    .message
                    .unwrap_or_else(|| "merge rejected by provider".to_string()),
            ),
            Err(e) if is_merge_rejection(&e) => MergeOutcome::Conflict(e.to_string()),
            Err(e) => MergeOutcome::ProviderError(e.to_string()),
        };

        debug!(number, merged = outcome.is_merged(), "merge attempt complete");
        Ok(outcome)
    }

    async fn config_file(&self) -> Result<Option<String>> {
        let url = self.api_url(&format!("contents/{}", crate::config::CONFIG_FILE));
        let response = self.raw_get(&url).await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Failed to fetch {}: {}",
                crate::config::CONFIG_FILE,
                response.status()
            )));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse contents response: {e}")))?;

        let Some(encoded) = contents.content else {
            return Ok(None);
        };

        // The contents API returns base64 with embedded newlines
        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(cleaned)
            .map_err(|e| Error::GitHubApi(format!("Invalid base64 in contents response: {e}")))?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn repo(&self) -> &RepoHandle {
        &self.repo
    }
}
