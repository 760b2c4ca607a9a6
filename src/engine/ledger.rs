//! Contribution ledger and review aggregation - pure functions
//!
//! No I/O happens here - all data is passed in, making it easy to unit
//! test. The ledger is rebuilt from scratch on every evaluation.

use crate::types::{Contributor, ContributorStat, ReviewEvent, ReviewState};
use std::collections::BTreeMap;

/// Contributor login → voting record for one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    contributors: BTreeMap<String, Contributor>,
}

impl Ledger {
    /// Build the ledger from the repository's per-author commit statistics.
    ///
    /// The pull request author is always present, with weight 0 if they
    /// have no prior commits; otherwise the author's implicit approval
    /// (see [`with_reviews`]) would be dropped.
    ///
    /// [`with_reviews`]: Self::with_reviews
    pub fn from_stats(stats: &[ContributorStat], author: &str) -> Self {
        let mut contributors: BTreeMap<String, Contributor> = stats
            .iter()
            .map(|stat| {
                (
                    stat.login.clone(),
                    Contributor::new(stat.login.clone(), stat.total_commits),
                )
            })
            .collect();

        contributors
            .entry(author.to_string())
            .or_insert_with(|| Contributor::new(author.to_string(), 0));

        Self { contributors }
    }

    /// Fold a batch of reviews into the ledger.
    ///
    /// Keeps one decision per reviewer: the review with the latest
    /// `submitted_at` wins; on a timestamp tie the first seen wins (the
    /// provider returns reviews in chronological order). `COMMENTED`
    /// reviews are informational and never change the vote. Reviewers not
    /// in the ledger join with weight 0. The author's decision is forced
    /// to +1 afterwards: opening a pull request is an implicit
    /// self-approval that overrides any stale review record.
    #[must_use]
    pub fn with_reviews(mut self, reviews: &[ReviewEvent], author: &str) -> Self {
        for review in reviews {
            self.apply_review(review);
        }
        self.force_author_approval(author);
        self
    }

    /// Fold a single incoming review (webhook path) into the ledger.
    ///
    /// The incoming review is the newest by definition, so it replaces
    /// whatever decision was on record for that reviewer; the author's
    /// forced approval still takes precedence.
    #[must_use]
    pub fn with_review(mut self, review: &ReviewEvent, author: &str) -> Self {
        if review.state != ReviewState::Commented {
            let contributor = self
                .contributors
                .entry(review.reviewer_login.clone())
                .or_insert_with(|| Contributor::new(review.reviewer_login.clone(), 0));
            contributor.review_value = review.state.vote_value();
            contributor.review_submitted_at = Some(review.submitted_at);
        }
        self.force_author_approval(author);
        self
    }

    fn apply_review(&mut self, review: &ReviewEvent) {
        if review.state == ReviewState::Commented {
            return;
        }

        let contributor = self
            .contributors
            .entry(review.reviewer_login.clone())
            .or_insert_with(|| Contributor::new(review.reviewer_login.clone(), 0));

        // Strictly-later only: on equal timestamps the first seen wins
        let newer = match contributor.review_submitted_at {
            Some(existing) => review.submitted_at > existing,
            None => true,
        };
        if newer {
            contributor.review_value = review.state.vote_value();
            contributor.review_submitted_at = Some(review.submitted_at);
        }
    }

    fn force_author_approval(&mut self, author: &str) {
        let contributor = self
            .contributors
            .entry(author.to_string())
            .or_insert_with(|| Contributor::new(author.to_string(), 0));
        contributor.review_value = 1;
    }

    /// Look up a contributor by login.
    pub fn get(&self, login: &str) -> Option<&Contributor> {
        self.contributors.get(login)
    }

    /// Iterate over all contributors.
    pub fn contributors(&self) -> impl Iterator<Item = &Contributor> {
        self.contributors.values()
    }

    /// Number of contributors in the ledger.
    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    /// Whether the ledger has no contributors.
    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }
}
