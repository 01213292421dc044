//! Octocrab client construction helpers for gateway implementations.

use http::Uri;
use http::header::ACCEPT;
use octocrab::Octocrab;

use crate::github::error::CheckError;
use crate::github::locator::BearerToken;

use super::error_mapping::map_octocrab_error;

const GITHUB_V3_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Builds an Octocrab client for the given token and API base URL.
///
/// # Errors
///
/// Returns an unknown-kind [`CheckError`] when the base URI cannot be parsed
/// or Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &BearerToken,
    api_base: &str,
) -> Result<Octocrab, CheckError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| CheckError::unknown(format!("invalid API base URL: {error}")))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .add_header(ACCEPT, GITHUB_V3_MEDIA_TYPE.to_owned())
        .base_uri(base_uri)
        .map_err(|error| CheckError::unknown(format!("build client failed: {error}")))?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
