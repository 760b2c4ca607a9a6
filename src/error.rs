//! Error types for crowdmerge

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while evaluating and acting on pull requests.
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub REST API returned an error we could not recover from.
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Error from the octocrab client.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// Error from a raw HTTP request.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic platform failure (used by test doubles and factories).
    #[error("platform error: {0}")]
    Platform(String),

    /// Registration store failure (unreadable or malformed registry file).
    #[error("registry error: {0}")]
    Registry(String),
}
