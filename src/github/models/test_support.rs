//! Test helpers for constructing `PullRequest` fixtures.
//!
//! # Examples
//!
//! ```
//! use revwatch::github::models::test_support::review_request;
//!
//! let pr = review_request(1, 101, "org/repo");
//! assert_eq!(pr.id, 1);
//! assert_eq!(pr.number, 101);
//! assert!(!pr.authored);
//! ```

use super::{PullRequest, ReviewInfo, ReviewState};

/// Constructs a pull request on which the configured user is a requested
/// reviewer.
#[must_use]
pub fn review_request(id: u64, number: u64, repository: &str) -> PullRequest {
    PullRequest {
        id,
        number,
        title: format!("Pull request #{number}"),
        url: format!("https://github.com/{repository}/pull/{number}"),
        repository: repository.to_owned(),
        author: "octocat".to_owned(),
        reviews: None,
        authored: false,
    }
}

/// Constructs a pull request authored by `author` with the given review
/// states.
#[must_use]
pub fn authored_pull_request(
    id: u64,
    number: u64,
    repository: &str,
    author: &str,
    reviews: &[(&str, ReviewState)],
) -> PullRequest {
    PullRequest {
        author: author.to_owned(),
        reviews: Some(
            reviews
                .iter()
                .map(|(reviewer, state)| ReviewInfo {
                    reviewer: (*reviewer).to_owned(),
                    display_name: None,
                    state: *state,
                })
                .collect(),
        ),
        authored: true,
        ..review_request(id, number, repository)
    }
}
