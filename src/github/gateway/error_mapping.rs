//! Classification of failed GitHub requests into [`CheckErrorKind`]s.

use http::{HeaderMap, StatusCode};

use crate::github::error::{CheckError, CheckErrorKind};
use crate::github::rate_limit::RateLimitInfo;

use super::http_utils::{
    extract_github_message, organisation_from_sso_url, sso_authorization_url, sso_required,
};

/// Operation name of the repository access check.
pub(crate) const REPOSITORY_ACCESS: &str = "repository access";

/// Checks if an octocrab error represents a network/transport issue.
pub(crate) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

pub(crate) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> CheckError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return classify_status(
            operation,
            source.status_code,
            &HeaderMap::new(),
            source.message.clone(),
            None,
        );
    }

    if is_network_error(error) {
        return CheckError::network(format!("{operation} failed: {error}"))
            .with_detail("check the network connection");
    }

    CheckError::unknown(format!("{operation} failed: {error}"))
}

/// Classifies a non-success HTTP response.
///
/// `owner` names the organisation shown when SSO authorisation is missing.
pub(crate) fn classify_http_failure(
    operation: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    owner: Option<&str>,
) -> CheckError {
    let message = extract_github_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("no message")
            .to_owned()
    });
    classify_status(operation, status, headers, message, owner)
}

fn classify_status(
    operation: &str,
    status: StatusCode,
    headers: &HeaderMap,
    message: String,
    owner: Option<&str>,
) -> CheckError {
    match status {
        StatusCode::UNAUTHORIZED => classify_unauthorised(&message),
        StatusCode::FORBIDDEN => classify_forbidden(headers, &message, owner),
        StatusCode::NOT_FOUND => classify_not_found(operation),
        other => CheckError::unknown(format!(
            "{operation} failed with status {other}: {message}"
        )),
    }
}

fn classify_not_found(operation: &str) -> CheckError {
    if operation == REPOSITORY_ACCESS {
        return CheckError::new(
            CheckErrorKind::RepoAccess,
            "repository not found or not accessible",
        )
        .with_detail("check the repository name and that the token can read it");
    }
    CheckError::new(
        CheckErrorKind::RepoAccess,
        format!("{operation} failed: not found or not accessible"),
    )
    .with_detail("the resource may have been removed or the token cannot read it")
}

fn classify_unauthorised(message: &str) -> CheckError {
    let lowered = message.to_lowercase();
    let text = if lowered.contains("expired") {
        "GitHub token expired".to_owned()
    } else if lowered.contains("bad credentials")
        || lowered.contains("malformed")
        || lowered.contains("invalid")
    {
        "GitHub token is invalid".to_owned()
    } else {
        format!("GitHub authentication failed: {message}")
    };
    CheckError::new(CheckErrorKind::Auth, text).with_detail("sign in again or replace the token")
}

fn classify_forbidden(headers: &HeaderMap, message: &str, owner: Option<&str>) -> CheckError {
    if let Some(info) = RateLimitInfo::from_headers(headers).filter(RateLimitInfo::is_exhausted) {
        let detail = info.reset_time().map_or_else(
            || "increase the check interval".to_owned(),
            |reset| {
                format!(
                    "increase the check interval; quota resets at {}",
                    reset.to_rfc3339()
                )
            },
        );
        return CheckError::new(CheckErrorKind::RateLimit, "GitHub API rate limit exceeded")
            .with_detail(detail);
    }

    let lowered = message.to_lowercase();
    if sso_required(headers) || lowered.contains("saml") || lowered.contains("single sign-on") {
        let url = sso_authorization_url(headers);
        let organisation = url
            .as_deref()
            .and_then(organisation_from_sso_url)
            .or_else(|| owner.map(ToOwned::to_owned))
            .unwrap_or_else(|| "the organisation".to_owned());
        let error = CheckError::new(
            CheckErrorKind::Auth,
            format!("{organisation} requires SAML SSO authorisation for this token"),
        );
        return match url {
            Some(url) => error.with_detail(url),
            None => error,
        };
    }

    CheckError::new(
        CheckErrorKind::Auth,
        format!("GitHub denied access: {message}"),
    )
    .with_detail("check the token's scopes")
}
