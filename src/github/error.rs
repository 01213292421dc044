//! Error types exposed by the GitHub review layer.
//!
//! Every failed request is classified into a [`CheckErrorKind`] so callers can
//! offer remediation without parsing messages. A [`CheckError`] is never fatal
//! to a whole check cycle; it is collected into the cycle result instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed check operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckErrorKind {
    /// The token was rejected, expired, or lacks organisation authorisation.
    Auth,
    /// Transport failed before GitHub returned a status.
    Network,
    /// The repository is missing, private, or misnamed.
    RepoAccess,
    /// The API quota is exhausted.
    RateLimit,
    /// Anything GitHub returned that does not fit the other kinds.
    Unknown,
}

impl CheckErrorKind {
    /// Returns a short lowercase label for logs and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Network => "network",
            Self::RepoAccess => "repo_access",
            Self::RateLimit => "rate_limit",
            Self::Unknown => "unknown",
        }
    }
}

/// A classified failure from a single check operation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct CheckError {
    /// Classification of the failure.
    pub kind: CheckErrorKind,
    /// Human readable description.
    pub message: String,
    /// Repository full name (`owner/repo`) the failure belongs to, if any.
    pub repository: Option<String>,
    /// Remediation detail, such as an SSO authorisation URL.
    pub detail: Option<String>,
}

impl CheckError {
    /// Creates an error of the given kind without repository context.
    #[must_use]
    pub fn new(kind: CheckErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            repository: None,
            detail: None,
        }
    }

    /// Creates an [`CheckErrorKind::Unknown`] error.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(CheckErrorKind::Unknown, message)
    }

    /// Creates a [`CheckErrorKind::Network`] error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CheckErrorKind::Network, message)
    }

    /// Attaches remediation detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attaches the repository the failure belongs to.
    ///
    /// Existing context is kept so the innermost attribution wins.
    #[must_use]
    pub fn in_repository(mut self, repository: &str) -> Self {
        if self.repository.is_none() {
            self.repository = Some(repository.to_owned());
        }
        self
    }
}

/// Errors raised while validating repository names, tokens, and URLs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocatorError {
    /// The repository was not written as `owner/repo`.
    #[error("repository must be written as owner/repo, got `{value}`")]
    InvalidRepository {
        /// The rejected input.
        value: String,
    },

    /// The authentication token was missing or blank.
    #[error("GitHub token is required")]
    MissingToken,

    /// A base URL could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),
}
