//! Octocrab implementation of the review gateway.

use async_trait::async_trait;
use http::Uri;
use octocrab::Octocrab;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::debug;
use url::Url;

use crate::github::error::CheckError;
use crate::github::locator::{BearerToken, RepositorySlug};
use crate::github::models::{
    ApiPullRequestSummary, ApiRequestedReviewers, ApiReview, ApiUser, AuthenticatedUser,
    PullRequestSummary, RequestedReviewers, SubmittedReview,
};
use crate::github::pagination::PageCursor;

use super::ReviewGateway;
use super::client::build_octocrab_client;
use super::error_mapping::{REPOSITORY_ACCESS, classify_http_failure, map_octocrab_error};

/// Octocrab-backed review gateway.
pub struct OctocrabReviewGateway {
    client: Octocrab,
}

impl OctocrabReviewGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Builds an authenticated gateway for `api_base`.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an unknown-kind [`CheckError`] when the client cannot be built.
    pub fn for_token(token: &BearerToken, api_base: &Url) -> Result<Self, CheckError> {
        let api_base = api_base.as_str().trim_end_matches('/');
        let octocrab = build_octocrab_client(token, api_base)?;
        Ok(Self::new(octocrab))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: String,
        owner: Option<&str>,
    ) -> Result<T, CheckError> {
        let uri: Uri = path
            .parse::<Uri>()
            .map_err(|error| CheckError::unknown(format!("{operation}: invalid path: {error}")))?;
        debug!(operation, %uri, "GitHub request");

        let response = self
            .client
            ._get(uri)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = self
                .client
                .body_to_string(response)
                .await
                .unwrap_or_else(|_| String::new());
            return Err(classify_http_failure(
                operation, status, &headers, &body, owner,
            ));
        }

        let body = self
            .client
            .body_to_string(response)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;
        serde_json::from_str(&body).map_err(|error| {
            CheckError::unknown(format!("{operation} response deserialisation failed: {error}"))
        })
    }
}

#[async_trait]
impl ReviewGateway for OctocrabReviewGateway {
    async fn check_repository_access(
        &self,
        repository: &RepositorySlug,
    ) -> Result<(), CheckError> {
        self.get_json::<IgnoredAny>(
            REPOSITORY_ACCESS,
            repository.repository_path(),
            Some(repository.owner().as_str()),
        )
        .await
        .map(|_| ())
    }

    async fn list_open_pull_requests(
        &self,
        repository: &RepositorySlug,
        cursor: &PageCursor,
    ) -> Result<Vec<PullRequestSummary>, CheckError> {
        let page: Vec<ApiPullRequestSummary> = self
            .get_json(
                "list pull requests",
                repository.pulls_path(cursor.page(), cursor.per_page()),
                Some(repository.owner().as_str()),
            )
            .await?;
        Ok(page.into_iter().map(PullRequestSummary::from).collect())
    }

    async fn requested_reviewers(
        &self,
        repository: &RepositorySlug,
        number: u64,
    ) -> Result<RequestedReviewers, CheckError> {
        let requested: ApiRequestedReviewers = self
            .get_json(
                "requested reviewers",
                repository.requested_reviewers_path(number),
                Some(repository.owner().as_str()),
            )
            .await?;
        Ok(requested.into())
    }

    async fn list_reviews(
        &self,
        repository: &RepositorySlug,
        number: u64,
        cursor: &PageCursor,
    ) -> Result<Vec<SubmittedReview>, CheckError> {
        let page: Vec<ApiReview> = self
            .get_json(
                "list reviews",
                repository.reviews_path(number, cursor.page(), cursor.per_page()),
                Some(repository.owner().as_str()),
            )
            .await?;
        Ok(page.into_iter().filter_map(ApiReview::into_submitted).collect())
    }

    async fn authenticated_user(&self) -> Result<AuthenticatedUser, CheckError> {
        let user: ApiUser = self
            .get_json("authenticated user", "/user".to_owned(), None)
            .await?;
        user.into_authenticated()
            .ok_or_else(|| CheckError::unknown("authenticated user response has no login"))
    }
}
