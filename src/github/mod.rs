//! GitHub review data access.
//!
//! This module wraps Octocrab to check repository access, list open pull
//! requests, and read review requests and submitted reviews. Failures are
//! classified into [`CheckErrorKind`]s so callers can surface precise
//! remediation without exposing Octocrab internals.

pub mod error;
pub mod fetch;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod pagination;
pub mod rate_limit;
pub mod review_state;

pub use error::{CheckError, CheckErrorKind, LocatorError};
pub use fetch::{FetchOutcome, fetch_reviews};
pub use gateway::{OctocrabReviewGateway, ReviewGateway};
pub use locator::{BearerToken, DEFAULT_API_BASE, RepositorySlug};
pub use models::{PullRequest, ReviewInfo, ReviewState};

#[cfg(test)]
pub use gateway::MockReviewGateway;
