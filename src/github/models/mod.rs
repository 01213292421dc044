//! Data models for pull requests and reviews returned by the GitHub API.
//!
//! Types prefixed with `Api` are internal deserialisation targets that convert
//! into public domain types.

use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Verdict a reviewer has left on a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// The reviewer approved the changes.
    Approved,
    /// The reviewer requested changes.
    ChangesRequested,
    /// The reviewer only commented.
    Commented,
    /// A review is requested and not yet submitted.
    Pending,
}

impl ReviewState {
    /// Maps a GitHub review `state` string to a verdict.
    ///
    /// Only approvals and change requests are verdicts; comments, dismissed
    /// reviews, and draft reviews return `None`.
    #[must_use]
    pub fn verdict_from_api(state: &str) -> Option<Self> {
        match state {
            "APPROVED" => Some(Self::Approved),
            "CHANGES_REQUESTED" => Some(Self::ChangesRequested),
            _ => None,
        }
    }
}

/// Latest review state of one reviewer on one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInfo {
    /// Reviewer login.
    pub reviewer: String,
    /// Reviewer display name when GitHub provides one.
    pub display_name: Option<String>,
    /// Latest verdict.
    pub state: ReviewState,
}

/// An open pull request observed during a check cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Server-assigned identifier, stable across cycles.
    pub id: u64,
    /// Pull request number shown to users.
    pub number: u64,
    /// Title of the pull request.
    pub title: String,
    /// HTML URL for displaying to a user.
    pub url: String,
    /// Repository full name (`owner/repo`).
    pub repository: String,
    /// Author login.
    pub author: String,
    /// Review states, only populated for pull requests the user authored.
    pub reviews: Option<Vec<ReviewInfo>>,
    /// Whether the configured user authored this pull request.
    pub authored: bool,
}

impl PullRequest {
    /// Sort key giving deterministic ordering within results.
    #[must_use]
    pub fn sort_key(&self) -> (&str, u64) {
        (self.repository.as_str(), self.number)
    }
}

/// Reviewers currently requested on a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedReviewers {
    /// Requested user logins.
    pub users: Vec<String>,
}

impl RequestedReviewers {
    /// Returns true if `login` is among the requested users
    /// (case-insensitive).
    #[must_use]
    pub fn includes(&self, login: &str) -> bool {
        self.users.iter().any(|user| user.eq_ignore_ascii_case(login))
    }
}

/// A submitted review as listed by the reviews endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedReview {
    /// Reviewer login.
    pub reviewer: String,
    /// Reviewer display name when present.
    pub display_name: Option<String>,
    /// Raw GitHub state (`APPROVED`, `CHANGES_REQUESTED`, `COMMENTED`, ...).
    pub state: String,
    /// Submission timestamp (ISO 8601) when present.
    pub submitted_at: Option<String>,
}

/// An open pull request as listed by the pulls endpoint, before review
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    /// Server-assigned identifier.
    pub id: u64,
    /// Pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// HTML URL.
    pub url: String,
    /// Author login, empty when GitHub omits the user (deleted accounts).
    pub author: String,
}

impl PullRequestSummary {
    /// Builds the domain pull request for `repository`.
    #[must_use]
    pub fn into_pull_request(
        self,
        repository: &str,
        reviews: Option<Vec<ReviewInfo>>,
        authored: bool,
    ) -> PullRequest {
        PullRequest {
            id: self.id,
            number: self.number,
            title: self.title,
            url: self.url,
            repository: repository.to_owned(),
            author: self.author,
            reviews,
            authored,
        }
    }
}

/// The authenticated user's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Login handle.
    pub login: String,
    /// Display name when set.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequestSummary {
    pub(crate) id: u64,
    pub(crate) number: u64,
    pub(crate) title: Option<String>,
    pub(crate) html_url: Option<String>,
    pub(crate) user: Option<ApiUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRequestedReviewers {
    #[serde(default)]
    pub(crate) users: Vec<ApiUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiReview {
    pub(crate) user: Option<ApiUser>,
    pub(crate) state: String,
    pub(crate) submitted_at: Option<String>,
}

impl From<ApiPullRequestSummary> for PullRequestSummary {
    fn from(value: ApiPullRequestSummary) -> Self {
        Self {
            id: value.id,
            number: value.number,
            title: value.title.unwrap_or_default(),
            url: value.html_url.unwrap_or_default(),
            author: value.user.and_then(|user| user.login).unwrap_or_default(),
        }
    }
}

impl From<ApiRequestedReviewers> for RequestedReviewers {
    fn from(value: ApiRequestedReviewers) -> Self {
        Self {
            users: value.users.into_iter().filter_map(|user| user.login).collect(),
        }
    }
}

impl ApiReview {
    pub(crate) fn into_submitted(self) -> Option<SubmittedReview> {
        let user = self.user?;
        Some(SubmittedReview {
            reviewer: user.login?,
            display_name: user.name,
            state: self.state,
            submitted_at: self.submitted_at,
        })
    }
}

impl ApiUser {
    pub(crate) fn into_authenticated(self) -> Option<AuthenticatedUser> {
        let name = self.name;
        self.login.map(|login| AuthenticatedUser { login, name })
    }
}
