//! Merging one cycle's fetch results with the persisted identifier sets.
//!
//! [`reconcile`] is pure: it takes the fetch outcome and the previous sets and
//! returns the new result, the pruned sets, and the notifications to send.
//! Every identifier set it returns is a subset of the cycle's valid ids, so
//! dismissals and notifications for pull requests that were merged, closed,
//! or no longer request the user's review are dropped.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::error::CheckError;
use crate::github::fetch::FetchOutcome;
use crate::github::models::PullRequest;

/// Outcome of one check cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrCheckResult {
    /// Review requests the user has not dismissed.
    pub active_pull_requests: Vec<PullRequest>,
    /// Review requests the user has dismissed.
    pub dismissed_pull_requests: Vec<PullRequest>,
    /// Pull requests the user authored, with review states.
    pub authored_pull_requests: Vec<PullRequest>,
    /// Identifiers of every review request seen this cycle.
    pub valid_ids: BTreeSet<u64>,
    /// Failures recorded during the cycle.
    pub errors: Vec<CheckError>,
    /// When the cycle completed.
    pub checked_at: DateTime<Utc>,
}

impl PrCheckResult {
    /// An empty result carrying only `errors`.
    #[must_use]
    pub fn failed(errors: Vec<CheckError>, checked_at: DateTime<Utc>) -> Self {
        Self {
            active_pull_requests: Vec::new(),
            dismissed_pull_requests: Vec::new(),
            authored_pull_requests: Vec::new(),
            valid_ids: BTreeSet::new(),
            errors,
            checked_at,
        }
    }

    /// Returns true when the cycle recorded at least one error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Moves pull request `id` from the active list to the dismissed list.
    ///
    /// Returns false when `id` is not currently active.
    pub fn dismiss(&mut self, id: u64) -> bool {
        move_between(
            &mut self.active_pull_requests,
            &mut self.dismissed_pull_requests,
            id,
        )
    }

    /// Moves pull request `id` from the dismissed list back to the active
    /// list.
    ///
    /// Returns false when `id` is not currently dismissed.
    pub fn undismiss(&mut self, id: u64) -> bool {
        move_between(
            &mut self.dismissed_pull_requests,
            &mut self.active_pull_requests,
            id,
        )
    }
}

fn move_between(from: &mut Vec<PullRequest>, to: &mut Vec<PullRequest>, id: u64) -> bool {
    let Some(position) = from.iter().position(|pr| pr.id == id) else {
        return false;
    };
    let pull_request = from.remove(position);
    to.push(pull_request);
    to.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));
    true
}

/// Identifier sets carried from one cycle to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedIds {
    /// Pull requests the user dismissed.
    pub dismissed_ids: BTreeSet<u64>,
    /// Pull requests the user was already notified about.
    pub notified_ids: BTreeSet<u64>,
}

/// Notifications to send after a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationPlan {
    /// One notification per newly seen review request.
    pub pull_requests: Vec<PullRequest>,
    /// Count for a summary notification, set when more than one request is
    /// new.
    pub summary_count: Option<usize>,
}

impl NotificationPlan {
    /// Returns true when nothing is to be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pull_requests.is_empty()
    }
}

/// Everything a cycle produces for persistence and notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The new cycle result.
    pub result: PrCheckResult,
    /// Identifier sets to persist.
    pub tracked: TrackedIds,
    /// Notifications to send.
    pub notifications: NotificationPlan,
}

/// Merges `fetched` with the previous `tracked` sets.
///
/// `notified_ids` is updated whether or not notifications are enabled, so
/// turning notifications on later does not replay old requests.
#[must_use]
pub fn reconcile(
    fetched: FetchOutcome,
    tracked: &TrackedIds,
    notifications_enabled: bool,
    checked_at: DateTime<Utc>,
) -> Reconciliation {
    let FetchOutcome {
        mut review_candidates,
        mut authored,
        errors,
    } = fetched;
    review_candidates.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));
    authored.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));

    let valid_ids: BTreeSet<u64> = review_candidates.iter().map(|pr| pr.id).collect();
    let dismissed_ids: BTreeSet<u64> = tracked
        .dismissed_ids
        .intersection(&valid_ids)
        .copied()
        .collect();

    let (dismissed, active): (Vec<PullRequest>, Vec<PullRequest>) = review_candidates
        .into_iter()
        .partition(|pr| dismissed_ids.contains(&pr.id));

    let newly_seen: Vec<PullRequest> = active
        .iter()
        .filter(|pr| !tracked.notified_ids.contains(&pr.id))
        .cloned()
        .collect();

    let notified_ids: BTreeSet<u64> = tracked
        .notified_ids
        .iter()
        .copied()
        .chain(newly_seen.iter().map(|pr| pr.id))
        .filter(|id| valid_ids.contains(id))
        .collect();

    let notifications = if notifications_enabled && !newly_seen.is_empty() {
        let count = newly_seen.len();
        NotificationPlan {
            pull_requests: newly_seen,
            summary_count: (count > 1).then_some(count),
        }
    } else {
        NotificationPlan::default()
    };

    Reconciliation {
        result: PrCheckResult {
            active_pull_requests: active,
            dismissed_pull_requests: dismissed,
            authored_pull_requests: authored,
            valid_ids,
            errors,
            checked_at,
        },
        tracked: TrackedIds {
            dismissed_ids,
            notified_ids,
        },
        notifications,
    }
}
