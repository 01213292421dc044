//! Shared HTTP utilities for gateway implementations.

use http::HeaderMap;
use http::header::HeaderValue;

const SSO_HEADER: &str = "x-github-sso";

pub(crate) fn header_to_string(header_value: Option<&HeaderValue>) -> Option<String> {
    header_value
        .and_then(|raw| raw.to_str().ok())
        .map(ToOwned::to_owned)
}

pub(crate) fn extract_github_message(body: &str) -> Option<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return None;
    };
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}

/// Returns true when GitHub flagged the response as requiring SAML SSO.
pub(crate) fn sso_required(headers: &HeaderMap) -> bool {
    header_to_string(headers.get(SSO_HEADER))
        .is_some_and(|value| value.trim_start().starts_with("required"))
}

/// Extracts the authorisation URL from `X-GitHub-SSO: required; url=<url>`.
pub(crate) fn sso_authorization_url(headers: &HeaderMap) -> Option<String> {
    let value = header_to_string(headers.get(SSO_HEADER))?;
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("url="))
        .map(ToOwned::to_owned)
}

/// Extracts `org` from an `https://github.com/orgs/<org>/sso?...` URL.
pub(crate) fn organisation_from_sso_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    match (segments.next(), segments.next()) {
        (Some("orgs"), Some(org)) if !org.is_empty() => Some(org.to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue};

    use super::{
        extract_github_message, organisation_from_sso_url, sso_authorization_url, sso_required,
    };

    #[test]
    fn reads_sso_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-github-sso",
            HeaderValue::from_static(
                "required; url=https://github.com/orgs/acme/sso?authorization_request=abc",
            ),
        );

        assert!(sso_required(&headers));
        let url = sso_authorization_url(&headers).expect("url should be present");
        assert_eq!(url, "https://github.com/orgs/acme/sso?authorization_request=abc");
        assert_eq!(organisation_from_sso_url(&url).as_deref(), Some("acme"));
    }

    #[test]
    fn extracts_message_only_from_json() {
        assert_eq!(
            extract_github_message(r#"{"message":"Not Found"}"#).as_deref(),
            Some("Not Found")
        );
        assert_eq!(extract_github_message("<html>"), None);
    }
}
