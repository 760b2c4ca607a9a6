//! Shared test fixtures
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

pub mod mock_platform;

pub use mock_platform::{MockPlatformFactory, MockPlatformService};

use chrono::{DateTime, TimeZone, Utc};
use crowdmerge::registry::RepositoryRegistration;
use crowdmerge::types::{ContributorStat, PullRequestSnapshot, ReviewEvent, ReviewState};

/// Shorthand for a UTC timestamp.
pub fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// A mergeable, non-draft pull request snapshot.
pub fn make_pull(number: u64, author: &str, created_at: DateTime<Utc>) -> PullRequestSnapshot {
    PullRequestSnapshot {
        number,
        author_login: author.to_string(),
        title: format!("Add feature #{number}"),
        commit_count: 1,
        created_at,
        mergeable: Some(true),
        head_ref: format!("feature-{number}"),
        is_draft: false,
    }
}

/// A review event.
pub fn review(login: &str, state: ReviewState, submitted_at: DateTime<Utc>) -> ReviewEvent {
    ReviewEvent {
        reviewer_login: login.to_string(),
        state,
        submitted_at,
    }
}

/// A contributor statistic entry.
pub fn stat(login: &str, total_commits: u64) -> ContributorStat {
    ContributorStat {
        login: login.to_string(),
        total_commits,
    }
}

/// A repository registration.
pub fn registration(full_name: &str) -> RepositoryRegistration {
    RepositoryRegistration {
        full_name: full_name.to_string(),
        token: "test-token".to_string(),
    }
}
