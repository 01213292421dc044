//! Scenario state for reconciliation BDD tests.

use std::collections::BTreeSet;

use revwatch::github::FetchOutcome;
use revwatch::reconcile::{Reconciliation, TrackedIds};
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// State shared across steps in a reconciliation scenario.
#[derive(ScenarioState, Default)]
pub(crate) struct ReconcileState {
    /// Identifier sets carried into the next reconciliation.
    pub(crate) tracked: Slot<TrackedIds>,
    /// Pull requests returned by the fetch stage.
    pub(crate) fetched: Slot<FetchOutcome>,
    /// Set when notifications are turned off.
    pub(crate) notifications_disabled: Slot<bool>,
    /// Output of the latest reconciliation.
    pub(crate) outcome: Slot<Reconciliation>,
}

/// Parses a comma-separated id list; `none` is the empty list.
pub(crate) fn parse_ids(text: &str) -> Vec<u64> {
    if text.trim() == "none" {
        return Vec::new();
    }
    text.split(',')
        .map(|value| {
            value
                .trim()
                .parse()
                .unwrap_or_else(|_| panic!("invalid id `{value}`"))
        })
        .collect()
}

/// Parses an id list into a set.
pub(crate) fn parse_id_set(text: &str) -> BTreeSet<u64> {
    parse_ids(text).into_iter().collect()
}
