//! Per-repository fetch loop for one check cycle.
//!
//! Repositories and pull requests are processed sequentially. A failure is
//! recorded with its repository and the loop moves on; nothing here aborts
//! the cycle.

use tracing::{debug, warn};

use super::error::CheckError;
use super::gateway::ReviewGateway;
use super::locator::RepositorySlug;
use super::models::{PullRequest, PullRequestSummary, SubmittedReview};
use super::pagination::PageCursor;
use super::review_state::merge_review_states;

/// Everything one fetch pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Open pull requests on which the user is a requested reviewer, ordered
    /// by (repository, number).
    pub review_candidates: Vec<PullRequest>,
    /// Open pull requests the user authored, with merged review states.
    pub authored: Vec<PullRequest>,
    /// Classified failures, each attributed to its repository.
    pub errors: Vec<CheckError>,
}

/// Fetches review candidates and authored pull requests for `username`.
pub async fn fetch_reviews(
    gateway: &dyn ReviewGateway,
    repositories: &[RepositorySlug],
    username: &str,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    for repository in repositories {
        fetch_repository(gateway, repository, username, &mut outcome).await;
    }
    outcome
        .review_candidates
        .sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));
    outcome
        .authored
        .sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));
    outcome
}

async fn fetch_repository(
    gateway: &dyn ReviewGateway,
    repository: &RepositorySlug,
    username: &str,
    outcome: &mut FetchOutcome,
) {
    let full_name = repository.full_name();

    if let Err(error) = gateway.check_repository_access(repository).await {
        record(outcome, error, &full_name);
        return;
    }

    let pulls = match list_all_open(gateway, repository).await {
        Ok(pulls) => pulls,
        Err(error) => {
            record(outcome, error, &full_name);
            return;
        }
    };
    debug!(repository = %full_name, count = pulls.len(), "listed open pull requests");

    for summary in pulls {
        let requested = match gateway.requested_reviewers(repository, summary.number).await {
            Ok(requested) => requested,
            Err(error) => {
                record(outcome, error, &full_name);
                continue;
            }
        };
        let is_author = summary.author.eq_ignore_ascii_case(username);

        if requested.includes(username) {
            outcome.review_candidates.push(
                summary
                    .clone()
                    .into_pull_request(&full_name, None, is_author),
            );
        }

        if is_author {
            match list_all_reviews(gateway, repository, summary.number).await {
                Ok(reviews) => {
                    let merged = merge_review_states(&reviews, &requested);
                    outcome
                        .authored
                        .push(summary.into_pull_request(&full_name, Some(merged), true));
                }
                Err(error) => record(outcome, error, &full_name),
            }
        }
    }
}

async fn list_all_open(
    gateway: &dyn ReviewGateway,
    repository: &RepositorySlug,
) -> Result<Vec<PullRequestSummary>, CheckError> {
    let mut cursor = PageCursor::new();
    let mut pulls = Vec::new();
    loop {
        let page = gateway.list_open_pull_requests(repository, &cursor).await?;
        let count = page.len();
        pulls.extend(page);
        if !cursor.advance(count) {
            return Ok(pulls);
        }
    }
}

async fn list_all_reviews(
    gateway: &dyn ReviewGateway,
    repository: &RepositorySlug,
    number: u64,
) -> Result<Vec<SubmittedReview>, CheckError> {
    let mut cursor = PageCursor::new();
    let mut reviews = Vec::new();
    loop {
        let page = gateway.list_reviews(repository, number, &cursor).await?;
        let count = page.len();
        reviews.extend(page);
        if !cursor.advance(count) {
            return Ok(reviews);
        }
    }
}

fn record(outcome: &mut FetchOutcome, error: CheckError, repository: &str) {
    let error = error.in_repository(repository);
    warn!(
        repository,
        kind = error.kind.as_str(),
        message = %error.message,
        "check failed for repository"
    );
    outcome.errors.push(error);
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};

    use super::{FetchOutcome, fetch_reviews};
    use crate::github::error::{CheckError, CheckErrorKind};
    use crate::github::gateway::MockReviewGateway;
    use crate::github::locator::RepositorySlug;
    use crate::github::models::{
        PullRequestSummary, RequestedReviewers, ReviewState, SubmittedReview,
    };
    use crate::github::pagination::PAGE_SIZE;

    fn summary(id: u64, number: u64, author: &str) -> PullRequestSummary {
        PullRequestSummary {
            id,
            number,
            title: format!("PR {number}"),
            url: format!("https://github.com/org/repo/pull/{number}"),
            author: author.to_owned(),
        }
    }

    fn requested(users: &[&str]) -> RequestedReviewers {
        RequestedReviewers {
            users: users.iter().map(|user| (*user).to_owned()).collect(),
        }
    }

    #[fixture]
    fn repositories() -> Vec<RepositorySlug> {
        vec![RepositorySlug::parse("org/repo").expect("slug should parse")]
    }

    fn run(gateway: &MockReviewGateway, repositories: &[RepositorySlug]) -> FetchOutcome {
        let runtime = tokio::runtime::Runtime::new().expect("runtime should start");
        runtime.block_on(fetch_reviews(gateway, repositories, "me"))
    }

    #[rstest]
    fn requested_pull_requests_become_candidates(repositories: Vec<RepositorySlug>) {
        let mut gateway = MockReviewGateway::new();
        gateway
            .expect_check_repository_access()
            .returning(|_| Ok(()));
        gateway
            .expect_list_open_pull_requests()
            .returning(|_, _| Ok(vec![summary(2, 102, "bob"), summary(1, 101, "amy")]));
        gateway
            .expect_requested_reviewers()
            .returning(|_, _| Ok(requested(&["ME"])));
        gateway.expect_list_reviews().never();

        let outcome = run(&gateway, &repositories);

        let numbers: Vec<u64> = outcome
            .review_candidates
            .iter()
            .map(|pr| pr.number)
            .collect();
        assert_eq!(numbers, [101, 102]);
        assert!(outcome.authored.is_empty());
        assert!(outcome.errors.is_empty());
        assert!(outcome.review_candidates.iter().all(|pr| pr.repository == "org/repo"));
    }

    #[rstest]
    fn access_failure_skips_repository(repositories: Vec<RepositorySlug>) {
        let mut gateway = MockReviewGateway::new();
        gateway.expect_check_repository_access().returning(|_| {
            Err(CheckError::new(
                CheckErrorKind::RepoAccess,
                "repository not found or not accessible",
            ))
        });
        gateway.expect_list_open_pull_requests().never();

        let outcome = run(&gateway, &repositories);

        assert_eq!(outcome.errors.len(), 1);
        let error = outcome.errors.first().expect("one error");
        assert_eq!(error.kind, CheckErrorKind::RepoAccess);
        assert_eq!(error.repository.as_deref(), Some("org/repo"));
    }

    #[rstest]
    fn sub_request_failure_moves_to_next_pull_request(repositories: Vec<RepositorySlug>) {
        let mut gateway = MockReviewGateway::new();
        gateway
            .expect_check_repository_access()
            .returning(|_| Ok(()));
        gateway
            .expect_list_open_pull_requests()
            .returning(|_, _| Ok(vec![summary(1, 101, "amy"), summary(2, 102, "bob")]));
        gateway
            .expect_requested_reviewers()
            .with(mockall::predicate::always(), eq(101))
            .returning(|_, _| Err(CheckError::network("connection reset")));
        gateway
            .expect_requested_reviewers()
            .with(mockall::predicate::always(), eq(102))
            .returning(|_, _| Ok(requested(&["me"])));

        let outcome = run(&gateway, &repositories);

        assert_eq!(outcome.review_candidates.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(
            outcome.errors.first().map(|error| error.kind),
            Some(CheckErrorKind::Network)
        );
    }

    #[rstest]
    fn authored_pull_requests_carry_merged_reviews(repositories: Vec<RepositorySlug>) {
        let mut gateway = MockReviewGateway::new();
        gateway
            .expect_check_repository_access()
            .returning(|_| Ok(()));
        gateway
            .expect_list_open_pull_requests()
            .returning(|_, _| Ok(vec![summary(5, 105, "Me")]));
        gateway
            .expect_requested_reviewers()
            .returning(|_, _| Ok(requested(&["rita"])));
        gateway.expect_list_reviews().returning(|_, _, _| {
            Ok(vec![
                SubmittedReview {
                    reviewer: "rita".to_owned(),
                    display_name: None,
                    state: "CHANGES_REQUESTED".to_owned(),
                    submitted_at: Some("2025-01-01T00:00:00Z".to_owned()),
                },
                SubmittedReview {
                    reviewer: "sam".to_owned(),
                    display_name: None,
                    state: "APPROVED".to_owned(),
                    submitted_at: Some("2025-01-02T00:00:00Z".to_owned()),
                },
            ])
        });

        let outcome = run(&gateway, &repositories);

        assert!(outcome.review_candidates.is_empty());
        let authored = outcome.authored.first().expect("one authored pull request");
        assert!(authored.authored);
        let states: Vec<(&str, ReviewState)> = authored
            .reviews
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|info| (info.reviewer.as_str(), info.state))
            .collect();
        assert_eq!(
            states,
            [("rita", ReviewState::Pending), ("sam", ReviewState::Approved)]
        );
    }

    #[rstest]
    fn paginates_until_short_page(repositories: Vec<RepositorySlug>) {
        let mut gateway = MockReviewGateway::new();
        gateway
            .expect_check_repository_access()
            .returning(|_| Ok(()));
        gateway
            .expect_list_open_pull_requests()
            .times(2)
            .returning(|_, cursor| {
                if cursor.page() == 1 {
                    Ok((0..u64::from(PAGE_SIZE))
                        .map(|offset| summary(1000 + offset, 1000 + offset, "amy"))
                        .collect())
                } else {
                    Ok(vec![summary(1, 1, "amy")])
                }
            });
        gateway
            .expect_requested_reviewers()
            .returning(|_, _| Ok(requested(&["me"])));

        let outcome = run(&gateway, &repositories);

        assert_eq!(outcome.review_candidates.len(), usize::from(PAGE_SIZE) + 1);
        assert_eq!(
            outcome.review_candidates.first().map(|pr| pr.number),
            Some(1)
        );
    }
}
