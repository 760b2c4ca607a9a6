//! crowdmerge - trust-weighted automatic merging of pull requests
//!
//! Computes, from a repository's contribution history and the reviews a
//! pull request has received, a weighted vote outcome and the instant at
//! which the pull request becomes eligible for automatic merge. Webhooks
//! keep the decision current as events arrive; a periodic sweep
//! re-evaluates everything and performs the merge once time has elapsed.

pub mod config;
pub mod engine;
pub mod error;
pub mod platform;
pub mod registry;
pub mod report;
pub mod sweep;
pub mod types;
pub mod webhook;
