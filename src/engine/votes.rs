//! Vote calculation - pure functions

use crate::engine::ledger::Ledger;
use crate::types::VoteResult;

/// Tally the weighted votes over the full ledger.
///
/// `votes_total` is the sum of all commit weights (author included);
/// `votes` weights each contributor's review decision by their commit
/// count. An empty or all-zero ledger yields coefficient 0 - there is no
/// division by zero.
#[must_use]
pub fn tally(ledger: &Ledger) -> VoteResult {
    let mut votes = 0.0;
    let mut votes_total = 0.0;

    for contributor in ledger.contributors() {
        #[allow(clippy::cast_precision_loss)]
        let weight = contributor.commit_weight as f64;
        votes_total += weight;
        votes += weight * f64::from(contributor.review_value);
    }

    let coefficient = if votes_total == 0.0 {
        0.0
    } else {
        votes / votes_total
    };

    VoteResult {
        votes,
        votes_total,
        coefficient,
    }
}
