//! Gateways for reading review data through Octocrab.
//!
//! The trait lets the checker run against a mock in tests while the Octocrab
//! implementation performs real HTTP requests.

mod client;
mod error_mapping;
mod http_utils;
mod reviews;

pub use reviews::OctocrabReviewGateway;

use async_trait::async_trait;

use crate::github::error::CheckError;
use crate::github::locator::RepositorySlug;
use crate::github::models::{
    AuthenticatedUser, PullRequestSummary, RequestedReviewers, SubmittedReview,
};
use crate::github::pagination::PageCursor;

/// Read-only access to the GitHub endpoints a check cycle needs.
///
/// Every failure is already classified into the error taxonomy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewGateway: Send + Sync {
    /// Verifies the repository exists and the credential can read it.
    async fn check_repository_access(&self, repository: &RepositorySlug)
    -> Result<(), CheckError>;

    /// Lists one page of open pull requests.
    async fn list_open_pull_requests(
        &self,
        repository: &RepositorySlug,
        cursor: &PageCursor,
    ) -> Result<Vec<PullRequestSummary>, CheckError>;

    /// Fetches the users currently requested to review a pull request.
    async fn requested_reviewers(
        &self,
        repository: &RepositorySlug,
        number: u64,
    ) -> Result<RequestedReviewers, CheckError>;

    /// Lists one page of submitted reviews on a pull request.
    async fn list_reviews(
        &self,
        repository: &RepositorySlug,
        number: u64,
        cursor: &PageCursor,
    ) -> Result<Vec<SubmittedReview>, CheckError>;

    /// Resolves the identity behind the credential.
    async fn authenticated_user(&self) -> Result<AuthenticatedUser, CheckError>;
}
