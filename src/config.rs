//! Per-repository configuration
//!
//! Repositories can tune merge timing and method by committing a
//! `.crowdmerge.ini` to their default branch. Absence of the file, fetch
//! failures, and unparsable values all fall back to the defaults; loading
//! configuration never fails an evaluation.

use crate::platform::PlatformService;
use crate::types::MergeMethod;
use tracing::{debug, warn};

/// Name of the in-repository configuration file.
pub const CONFIG_FILE: &str = ".crowdmerge.ini";

/// Per-repository merge configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RepoConfig {
    /// Base waiting period in hours (before per-commit additions)
    pub base_merge_hours: f64,
    /// Additional waiting hours per commit in the pull request
    pub per_commit_hours: f64,
    /// Merge method to use when merging
    pub merge_method: MergeMethod,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            base_merge_hours: 240.0,
            per_commit_hours: 0.0,
            merge_method: MergeMethod::Squash,
        }
    }
}

/// Load the repository configuration, falling back to defaults on any
/// failure.
pub async fn load(platform: &dyn PlatformService) -> RepoConfig {
    match platform.config_file().await {
        Ok(Some(content)) => {
            let config = parse_ini(&content);
            debug!(?config, "loaded repository configuration");
            config
        }
        Ok(None) => RepoConfig::default(),
        Err(e) => {
            warn!(error = %e, "failed to fetch {CONFIG_FILE}, using defaults");
            RepoConfig::default()
        }
    }
}

/// Parse the `.crowdmerge.ini` subset: `key = value` lines, `#`/`;`
/// comments, and section headers of which only `[DEFAULT]` is read.
/// Invalid or negative values keep the default for that key.
pub fn parse_ini(content: &str) -> RepoConfig {
    let mut config = RepoConfig::default();
    let mut in_default_section = true;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            in_default_section = trimmed[1..trimmed.len() - 1].trim() == "DEFAULT";
            continue;
        }

        if !in_default_section {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "baseMergeTimeInHours" => {
                if let Some(hours) = parse_hours(value) {
                    config.base_merge_hours = hours;
                }
            }
            "perCommitTimeInHours" => {
                if let Some(hours) = parse_hours(value) {
                    config.per_commit_hours = hours;
                }
            }
            "merge_method" => {
                if let Some(method) = MergeMethod::parse(value) {
                    config.merge_method = method;
                }
            }
            _ => {}
        }
    }

    config
}

fn parse_hours(value: &str) -> Option<f64> {
    let hours: f64 = value.parse().ok()?;
    (hours.is_finite() && hours >= 0.0).then_some(hours)
}
