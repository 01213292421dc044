//! Rate limit information from GitHub API responses.
//!
//! GitHub includes `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset` headers on every REST response. A `403` with a zero
//! remaining quota is a rate-limit rejection rather than a permission problem,
//! so the gateway reads these headers before classifying the failure.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use http::HeaderMap;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate limit information extracted from GitHub API response headers.
///
/// # Example
///
/// ```
/// use revwatch::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 0, 1700000000);
/// assert!(info.is_exhausted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    limit: u32,
    remaining: u32,
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates a new rate limit info instance.
    #[must_use]
    pub const fn new(limit: u32, remaining: u32, reset_at: u64) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
        }
    }

    /// Reads rate limit headers from a response.
    ///
    /// Returns `None` unless the remaining-quota header is present and
    /// numeric. Missing limit or reset headers default to zero.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_number(headers, REMAINING_HEADER)?;
        let limit = header_number(headers, LIMIT_HEADER).unwrap_or(0);
        let reset_at = headers
            .get(RESET_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Some(Self::new(limit, remaining, reset_at))
    }

    /// Returns the maximum requests allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the remaining requests in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the Unix timestamp when the rate limit resets.
    #[must_use]
    pub const fn reset_at(&self) -> u64 {
        self.reset_at
    }

    /// Returns true if the rate limit has been exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Returns the reset time as a UTC timestamp, if representable.
    #[must_use]
    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.reset_at).ok()?;
        DateTime::from_timestamp(seconds, 0)
    }

    /// Calculates seconds until the rate limit resets.
    ///
    /// Returns 0 if the reset time has already passed or if the system time
    /// cannot be determined.
    #[must_use]
    pub fn seconds_until_reset(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0);

        self.reset_at.saturating_sub(now)
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue};
    use rstest::rstest;

    use super::RateLimitInfo;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn seconds_until_reset_returns_zero_when_reset_has_passed() {
        let info = RateLimitInfo::new(5000, 0, 0);
        assert_eq!(info.seconds_until_reset(), 0);
    }

    #[test]
    fn from_headers_reads_all_values() {
        let map = headers(&[
            ("x-ratelimit-limit", "5000"),
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset", "1700000000"),
        ]);

        let info = RateLimitInfo::from_headers(&map).expect("headers should parse");

        assert_eq!(info, RateLimitInfo::new(5000, 0, 1_700_000_000));
        assert!(info.is_exhausted());
        assert!(info.reset_time().is_some());
    }

    #[rstest]
    #[case::missing(&[])]
    #[case::not_numeric(&[("x-ratelimit-remaining", "lots")])]
    fn from_headers_requires_numeric_remaining(#[case] pairs: &[(&'static str, &'static str)]) {
        assert_eq!(RateLimitInfo::from_headers(&headers(pairs)), None);
    }
}
