//! Merging submitted reviews into one verdict per reviewer.
//!
//! Reviews are replayed in submission order so the latest verdict wins.
//! Comment-only reviews never count as a verdict. A reviewer who is currently
//! requested again is shown as pending whatever they said before, because a
//! new request means the previous review was dismissed or a re-review was
//! asked for.

use std::collections::BTreeMap;

use super::models::{RequestedReviewers, ReviewInfo, ReviewState, SubmittedReview};

/// Merges submitted reviews and current review requests into one entry per
/// reviewer, ordered by reviewer login.
///
/// # Example
///
/// ```
/// use revwatch::github::models::{RequestedReviewers, ReviewState, SubmittedReview};
/// use revwatch::github::review_state::merge_review_states;
///
/// let reviews = vec![SubmittedReview {
///     reviewer: "alice".to_owned(),
///     display_name: None,
///     state: "APPROVED".to_owned(),
///     submitted_at: Some("2025-01-01T00:00:00Z".to_owned()),
/// }];
/// let merged = merge_review_states(&reviews, &RequestedReviewers::default());
/// assert_eq!(merged[0].state, ReviewState::Approved);
/// ```
#[must_use]
pub fn merge_review_states(
    reviews: &[SubmittedReview],
    requested: &RequestedReviewers,
) -> Vec<ReviewInfo> {
    let mut ordered: Vec<&SubmittedReview> = reviews.iter().collect();
    // RFC 3339 UTC timestamps order lexicographically. Unsubmitted reviews
    // sort first; the sort is stable so ties keep their listing order.
    ordered.sort_by(|left, right| left.submitted_at.cmp(&right.submitted_at));

    let mut latest: BTreeMap<String, ReviewInfo> = BTreeMap::new();
    for review in ordered {
        let Some(state) = ReviewState::verdict_from_api(&review.state) else {
            continue;
        };
        latest.insert(
            review.reviewer.to_lowercase(),
            ReviewInfo {
                reviewer: review.reviewer.clone(),
                display_name: review.display_name.clone(),
                state,
            },
        );
    }

    for user in &requested.users {
        latest
            .entry(user.to_lowercase())
            .and_modify(|info| info.state = ReviewState::Pending)
            .or_insert_with(|| ReviewInfo {
                reviewer: user.clone(),
                display_name: None,
                state: ReviewState::Pending,
            });
    }

    latest.into_values().collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::merge_review_states;
    use crate::github::models::{RequestedReviewers, ReviewState, SubmittedReview};

    fn review(reviewer: &str, state: &str, at: &str) -> SubmittedReview {
        SubmittedReview {
            reviewer: reviewer.to_owned(),
            display_name: None,
            state: state.to_owned(),
            submitted_at: Some(at.to_owned()),
        }
    }

    fn requested(users: &[&str]) -> RequestedReviewers {
        RequestedReviewers {
            users: users.iter().map(|user| (*user).to_owned()).collect(),
        }
    }

    #[test]
    fn re_requested_reviewer_is_pending() {
        let reviews = vec![review("rita", "CHANGES_REQUESTED", "2025-01-01T10:00:00Z")];

        let merged = merge_review_states(&reviews, &requested(&["rita"]));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].reviewer, "rita");
        assert_eq!(merged[0].state, ReviewState::Pending);
    }

    #[test]
    fn latest_submission_wins_regardless_of_listing_order() {
        let reviews = vec![
            review("rita", "APPROVED", "2025-01-02T00:00:00Z"),
            review("rita", "CHANGES_REQUESTED", "2025-01-01T00:00:00Z"),
        ];

        let merged = merge_review_states(&reviews, &RequestedReviewers::default());

        assert_eq!(merged[0].state, ReviewState::Approved);
    }

    #[rstest]
    #[case::comment_after_approval("COMMENTED", Some(ReviewState::Approved))]
    #[case::dismissed_after_approval("DISMISSED", Some(ReviewState::Approved))]
    #[case::changes_after_approval("CHANGES_REQUESTED", Some(ReviewState::ChangesRequested))]
    fn only_verdicts_overwrite(#[case] later: &str, #[case] expected: Option<ReviewState>) {
        let reviews = vec![
            review("sam", "APPROVED", "2025-01-01T00:00:00Z"),
            review("sam", later, "2025-01-03T00:00:00Z"),
        ];

        let merged = merge_review_states(&reviews, &RequestedReviewers::default());

        assert_eq!(merged.first().map(|info| info.state), expected);
    }

    #[test]
    fn comment_only_reviewer_is_not_recorded() {
        let reviews = vec![review("carl", "COMMENTED", "2025-01-01T00:00:00Z")];

        assert!(merge_review_states(&reviews, &RequestedReviewers::default()).is_empty());
    }

    #[test]
    fn requested_without_review_is_pending_and_sorted() {
        let reviews = vec![review("zed", "APPROVED", "2025-01-01T00:00:00Z")];

        let merged = merge_review_states(&reviews, &requested(&["amy"]));

        let names: Vec<_> = merged.iter().map(|info| info.reviewer.as_str()).collect();
        assert_eq!(names, ["amy", "zed"]);
        assert_eq!(merged[0].state, ReviewState::Pending);
        assert_eq!(merged[1].state, ReviewState::Approved);
    }
}
