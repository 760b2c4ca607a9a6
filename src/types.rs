//! Core types for crowdmerge

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Repository coordinates on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl RepoHandle {
    /// Split an `owner/repo` string into a handle.
    ///
    /// Returns `None` if the string does not contain exactly one `/`.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// `owner/repo` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Review decision states reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    /// Reviewer approved the pull request
    Approved,
    /// Reviewer requested changes
    ChangesRequested,
    /// Reviewer only left comments (never affects the vote)
    Commented,
}

impl ReviewState {
    /// Parse a provider state string; webhook and REST payloads disagree on
    /// casing (`approved` vs `APPROVED`), so matching is case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "changes_requested" => Some(Self::ChangesRequested),
            "commented" => Some(Self::Commented),
            _ => None,
        }
    }

    /// The vote value a review in this state contributes.
    pub const fn vote_value(self) -> i8 {
        match self {
            Self::Approved => 1,
            Self::ChangesRequested => -1,
            Self::Commented => 0,
        }
    }
}

/// A single review fetched from the provider (or carried in a webhook)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEvent {
    /// Login of the reviewer
    pub reviewer_login: String,
    /// Decision state of the review
    pub state: ReviewState,
    /// When the review was submitted
    pub submitted_at: DateTime<Utc>,
}

/// One contributor's standing within a single evaluation
///
/// Created fresh per evaluation and discarded afterwards; nothing here is
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    /// Contributor login
    pub login: String,
    /// Voting power: all-time commit count in the repository
    pub commit_weight: u64,
    /// Current review decision: -1, 0, or +1
    pub review_value: i8,
    /// When the counted review was submitted (None if no review counted)
    pub review_submitted_at: Option<DateTime<Utc>>,
}

impl Contributor {
    /// A contributor with the given weight and no review on record.
    pub const fn new(login: String, commit_weight: u64) -> Self {
        Self {
            login,
            commit_weight,
            review_value: 0,
            review_submitted_at: None,
        }
    }
}

/// Per-author commit totals from the repository statistics endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorStat {
    /// Author login
    pub login: String,
    /// All-time commit count
    pub total_commits: u64,
}

/// Immutable view of a pull request for the duration of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSnapshot {
    /// Pull request number
    pub number: u64,
    /// Login of the pull request author
    pub author_login: String,
    /// Pull request title
    pub title: String,
    /// Number of commits in the pull request
    pub commit_count: u64,
    /// When the pull request was opened
    pub created_at: DateTime<Utc>,
    /// Whether the provider considers it mergeable (None = still computing)
    pub mergeable: Option<bool>,
    /// Head branch name
    pub head_ref: String,
    /// Whether the pull request is a draft
    pub is_draft: bool,
}

impl PullRequestSnapshot {
    /// Draft pull requests and `[WIP]`-titled pull requests are excluded
    /// from automatic merging.
    pub fn is_draft_or_wip(&self) -> bool {
        self.is_draft || self.title.starts_with("[WIP]")
    }
}

/// Aggregated weighted vote tallies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteResult {
    /// Weighted net approval: Σ commit_weight × review_value
    pub votes: f64,
    /// Total voting power: Σ commit_weight over the full ledger
    pub votes_total: f64,
    /// votes / votes_total, or 0 when the ledger is empty
    pub coefficient: f64,
}

/// Candidate instants for the merge countdown start
///
/// The countdown starts at the latest of these; any absent candidate falls
/// back to the epoch sentinel so it never wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineCandidates {
    /// Pull request creation time
    pub created_at: DateTime<Utc>,
    /// Latest commit date on the pull request (max of author/committer date)
    pub latest_commit: Option<DateTime<Utc>>,
    /// Latest push event to the pull request's head branch
    pub latest_push: Option<DateTime<Utc>>,
    /// Latest removal of the WIP label
    pub wip_removed: Option<DateTime<Utc>>,
    /// Latest ready-for-review (undraft) transition
    pub ready_for_review: Option<DateTime<Utc>>,
}

/// Reset-relevant issue events for a pull request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueResetEvents {
    /// Latest removal of the WIP label
    pub wip_label_removed: Option<DateTime<Utc>>,
    /// Latest ready-for-review transition
    pub ready_for_review: Option<DateTime<Utc>>,
}

/// Commit status states we publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    /// The pull request is on track to merge
    Success,
    /// The pull request will not be merged
    Error,
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A commit status, either published or about to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatus {
    /// Status state
    pub state: StatusState,
    /// Human-readable one-line description
    pub description: String,
    /// Link to the dashboard for this pull request
    pub target_url: String,
    /// Status context identifier
    pub context: String,
}

/// The outcome of one scheduling evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct MergeDecision {
    /// The vote coefficient the decision was computed from
    pub coefficient: f64,
    /// Time elapsed since the countdown start
    pub age: Duration,
    /// Full waiting period at coefficient 0
    pub total_merge_duration: Duration,
    /// Waiting period after scaling by (1 - coefficient)
    pub merge_duration: Duration,
    /// When the pull request becomes eligible (None = will not merge)
    pub eligible_at: Option<DateTime<Utc>>,
    /// Whether the merge can be performed right now
    pub now_eligible: bool,
    /// State for the published status check
    pub status_state: StatusState,
    /// Description for the published status check
    pub status_description: String,
}

impl MergeDecision {
    /// Whether the decision is the terminal "will not merge" state.
    pub const fn is_blocked(&self) -> bool {
        self.eligible_at.is_none()
    }

    /// Whole days until the merge, rounded up. Zero once eligible or blocked.
    pub fn days_remaining(&self) -> i64 {
        if self.is_blocked() {
            return 0;
        }
        let remaining = self.merge_duration - self.age;
        if remaining <= Duration::zero() {
            return 0;
        }
        (remaining.num_seconds() + 86_399) / 86_400
    }
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMethod {
    /// Squash all commits into one
    Squash,
    /// Create a merge commit
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl MergeMethod {
    /// Parse a configuration value (`merge`/`squash`/`rebase`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "squash" => Some(Self::Squash),
            "merge" => Some(Self::Merge),
            "rebase" => Some(Self::Rebase),
            _ => None,
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

/// Result of a merge attempt
///
/// Merge rejections are data, not errors: a conflict must never abort the
/// reconciliation sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The pull request was merged
    Merged {
        /// SHA of the merge commit, when the provider reports one
        sha: Option<String>,
    },
    /// The provider refused the merge (conflict or rule violation)
    Conflict(String),
    /// The provider failed in some other way
    ProviderError(String),
}

impl MergeOutcome {
    /// Whether the merge went through.
    pub const fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}
