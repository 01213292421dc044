//! Repository identity, token, and endpoint path helpers.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::LocatorError;

/// Default REST API base for github.com.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A configured `owner/repo` pair.
///
/// # Example
///
/// ```
/// use revwatch::github::RepositorySlug;
///
/// let slug = RepositorySlug::parse("octo/hello").expect("should parse slug");
/// assert_eq!(slug.owner().as_str(), "octo");
/// assert_eq!(slug.full_name(), "octo/hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositorySlug {
    owner: RepositoryOwner,
    repository: RepositoryName,
}

impl RepositorySlug {
    /// Parses `owner/repo`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::InvalidRepository`] unless the input has exactly
    /// two non-empty segments.
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let trimmed = input.trim();
        let invalid = || LocatorError::InvalidRepository {
            value: input.to_owned(),
        };
        let (owner, repository) = trimmed.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || repository.is_empty() || repository.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            owner: RepositoryOwner(owner.to_owned()),
            repository: RepositoryName(repository.to_owned()),
        })
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Returns `owner/repo`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.as_str(), self.repository.as_str())
    }

    pub(crate) fn repository_path(&self) -> String {
        format!("/repos/{}", self.full_name())
    }

    pub(crate) fn pulls_path(&self, page: u32, per_page: u8) -> String {
        format!(
            "{}/pulls?state=open&per_page={per_page}&page={page}",
            self.repository_path()
        )
    }

    pub(crate) fn requested_reviewers_path(&self, number: u64) -> String {
        format!("{}/pulls/{number}/requested_reviewers", self.repository_path())
    }

    pub(crate) fn reviews_path(&self, number: u64, page: u32, per_page: u8) -> String {
        format!(
            "{}/pulls/{number}/reviews?per_page={per_page}&page={page}",
            self.repository_path()
        )
    }
}

impl fmt::Display for RepositorySlug {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}/{}",
            self.owner.as_str(),
            self.repository.as_str()
        )
    }
}

/// Bearer token wrapper enforcing presence.
///
/// The token value is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`LocatorError::MissingToken`] when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, LocatorError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LocatorError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for BearerToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("BearerToken(..)")
    }
}

/// Parses a base URL, requiring an http or https scheme.
///
/// # Errors
///
/// Returns [`LocatorError::InvalidUrl`] when parsing fails or the scheme is
/// not http(s).
pub fn parse_base_url(input: &str) -> Result<Url, LocatorError> {
    let parsed = Url::parse(input.trim()).map_err(|error| LocatorError::InvalidUrl(error.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(LocatorError::InvalidUrl(format!(
            "unsupported scheme `{other}` in {input}"
        ))),
    }
}
