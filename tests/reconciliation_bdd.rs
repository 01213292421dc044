//! Behavioural tests for reconciling fetched review requests with tracked
//! dismissed and notified identifiers.

#[path = "reconciliation_bdd/mod.rs"]
mod reconciliation_bdd_support;

use chrono::Utc;
use reconciliation_bdd_support::{ReconcileState, parse_id_set, parse_ids};
use revwatch::github::FetchOutcome;
use revwatch::github::models::test_support::review_request;
use revwatch::reconcile::{Reconciliation, TrackedIds, reconcile};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// Pull request numbers in scenarios start at 101; ids start at 1.
const NUMBER_OFFSET: u64 = 100;

#[fixture]
fn reconcile_state() -> ReconcileState {
    ReconcileState::default()
}

fn numbers_of(pull_requests: &[revwatch::PullRequest]) -> Vec<u64> {
    pull_requests.iter().map(|pr| pr.number).collect()
}

#[expect(clippy::expect_used, reason = "BDD test step; panics are acceptable")]
fn outcome(reconcile_state: &ReconcileState) -> Reconciliation {
    reconcile_state
        .outcome
        .get()
        .expect("reconciliation not run")
}

// Given steps

#[given("no tracked pull requests")]
fn given_no_tracked(reconcile_state: &ReconcileState) {
    reconcile_state.tracked.set(TrackedIds::default());
}

#[given("dismissed ids {ids}")]
fn given_dismissed_ids(reconcile_state: &ReconcileState, ids: String) {
    reconcile_state.tracked.set(TrackedIds {
        dismissed_ids: parse_id_set(&ids),
        ..TrackedIds::default()
    });
}

#[given("notifications are disabled")]
fn given_notifications_disabled(reconcile_state: &ReconcileState) {
    reconcile_state.notifications_disabled.set(true);
}

#[given("review requests for pull requests {numbers} in {repository}")]
fn given_review_requests(reconcile_state: &ReconcileState, numbers: String, repository: String) {
    let review_candidates = parse_ids(&numbers)
        .into_iter()
        .map(|number| review_request(number - NUMBER_OFFSET, number, &repository))
        .collect();
    reconcile_state.fetched.set(FetchOutcome {
        review_candidates,
        ..FetchOutcome::default()
    });
}

fn run_reconcile(reconcile_state: &ReconcileState) {
    let tracked = reconcile_state.tracked.get().unwrap_or_default();
    let fetched = reconcile_state.fetched.get().unwrap_or_default();
    let enabled = !reconcile_state.notifications_disabled.get().unwrap_or(false);

    reconcile_state
        .outcome
        .set(reconcile(fetched, &tracked, enabled, Utc::now()));
}

// When steps

#[when("the review requests are reconciled")]
fn when_reconciled(reconcile_state: &ReconcileState) {
    run_reconcile(reconcile_state);
}

#[when("the review requests are reconciled again")]
fn when_reconciled_again(reconcile_state: &ReconcileState) {
    let previous = outcome(reconcile_state);
    reconcile_state.tracked.set(previous.tracked.clone());

    run_reconcile(reconcile_state);

    let mut repeated = outcome(reconcile_state).result;
    repeated.checked_at = previous.result.checked_at;
    assert_eq!(repeated, previous.result, "results should not change");
}

// Then steps

#[then("the active pull requests are {numbers}")]
fn then_active(reconcile_state: &ReconcileState, numbers: String) {
    let result = outcome(reconcile_state).result;

    assert_eq!(numbers_of(&result.active_pull_requests), parse_ids(&numbers));
}

#[then("the dismissed pull requests are {numbers}")]
fn then_dismissed(reconcile_state: &ReconcileState, numbers: String) {
    let result = outcome(reconcile_state).result;

    assert_eq!(
        numbers_of(&result.dismissed_pull_requests),
        parse_ids(&numbers)
    );
}

#[then("the dismissed ids are {ids}")]
fn then_dismissed_ids(reconcile_state: &ReconcileState, ids: String) {
    let tracked = outcome(reconcile_state).tracked;

    assert_eq!(tracked.dismissed_ids, parse_id_set(&ids));
    assert!(
        tracked
            .dismissed_ids
            .is_subset(&outcome(reconcile_state).result.valid_ids),
        "dismissed ids must be valid ids"
    );
}

#[then("the notified ids are {ids}")]
fn then_notified_ids(reconcile_state: &ReconcileState, ids: String) {
    let reconciliation = outcome(reconcile_state);

    assert_eq!(reconciliation.tracked.notified_ids, parse_id_set(&ids));
    assert!(
        reconciliation
            .tracked
            .notified_ids
            .is_subset(&reconciliation.result.valid_ids),
        "notified ids must be valid ids"
    );
}

#[then("{count:usize} review notifications are planned with a summary")]
fn then_notifications_with_summary(reconcile_state: &ReconcileState, count: usize) {
    let plan = outcome(reconcile_state).notifications;

    assert_eq!(plan.pull_requests.len(), count);
    assert_eq!(plan.summary_count, Some(count));
}

#[then("{count:usize} review notifications are planned without a summary")]
fn then_notifications_without_summary(reconcile_state: &ReconcileState, count: usize) {
    let plan = outcome(reconcile_state).notifications;

    assert_eq!(plan.pull_requests.len(), count);
    assert_eq!(plan.summary_count, None);
}

// Scenario bindings

#[scenario(path = "tests/features/reconciliation.feature", index = 0)]
fn new_requests_are_notified_once(reconcile_state: ReconcileState) {
    let _ = reconcile_state;
}

#[scenario(path = "tests/features/reconciliation.feature", index = 1)]
fn dismissed_request_stays_dismissed(reconcile_state: ReconcileState) {
    let _ = reconcile_state;
}

#[scenario(path = "tests/features/reconciliation.feature", index = 2)]
fn stale_dismissals_are_pruned(reconcile_state: ReconcileState) {
    let _ = reconcile_state;
}

#[scenario(path = "tests/features/reconciliation.feature", index = 3)]
fn repeated_cycle_changes_nothing(reconcile_state: ReconcileState) {
    let _ = reconcile_state;
}

#[scenario(path = "tests/features/reconciliation.feature", index = 4)]
fn disabled_notifications_still_track(reconcile_state: ReconcileState) {
    let _ = reconcile_state;
}
