//! Output formatting utilities for CLI operations.

use std::io::Write;

use revwatch::auth::DeviceCodeGrant;
use revwatch::{CheckError, PrCheckResult, PullRequest, ReviewState, RevwatchError};

/// Writes a human readable summary of a check result.
///
/// # Errors
///
/// Returns [`RevwatchError::Io`] when the writer fails.
pub fn write_result_summary_to<W: Write>(
    writer: &mut W,
    result: &PrCheckResult,
) -> Result<(), RevwatchError> {
    write_section(writer, "Awaiting your review", &result.active_pull_requests)?;
    if !result.dismissed_pull_requests.is_empty() {
        write_section(writer, "Dismissed", &result.dismissed_pull_requests)?;
    }
    if !result.authored_pull_requests.is_empty() {
        write_section(writer, "Your pull requests", &result.authored_pull_requests)?;
    }
    if !result.errors.is_empty() {
        writeln!(writer, "Errors ({}):", result.errors.len())?;
        for error in &result.errors {
            write_error(writer, error)?;
        }
    }
    writeln!(writer, "Checked at {}", result.checked_at.to_rfc3339())?;
    Ok(())
}

fn write_section<W: Write>(
    writer: &mut W,
    heading: &str,
    pull_requests: &[PullRequest],
) -> Result<(), RevwatchError> {
    writeln!(writer, "{heading} ({}):", pull_requests.len())?;
    for pr in pull_requests {
        writeln!(
            writer,
            "  [{}] {}#{} {} (@{})",
            pr.id, pr.repository, pr.number, pr.title, pr.author
        )?;
        writeln!(writer, "      {}", pr.url)?;
        if let Some(reviews) = pr.reviews.as_deref().filter(|reviews| !reviews.is_empty()) {
            let states: Vec<String> = reviews
                .iter()
                .map(|review| format!("{} {}", review.reviewer, state_label(review.state)))
                .collect();
            writeln!(writer, "      reviews: {}", states.join(", "))?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

fn write_error<W: Write>(writer: &mut W, error: &CheckError) -> Result<(), RevwatchError> {
    let scope = error.repository.as_deref().unwrap_or("all repositories");
    writeln!(
        writer,
        "  {} ({scope}): {}",
        error.kind.as_str(),
        error.message
    )?;
    if let Some(detail) = &error.detail {
        writeln!(writer, "      {detail}")?;
    }
    Ok(())
}

const fn state_label(state: ReviewState) -> &'static str {
    match state {
        ReviewState::Approved => "approved",
        ReviewState::ChangesRequested => "requested changes",
        ReviewState::Commented => "commented",
        ReviewState::Pending => "pending",
    }
}

/// Writes the device-flow sign-in instructions.
///
/// # Errors
///
/// Returns [`RevwatchError::Io`] when the writer fails.
pub fn write_device_prompt_to<W: Write>(
    writer: &mut W,
    grant: &DeviceCodeGrant,
) -> Result<(), RevwatchError> {
    writeln!(writer, "Open {} and enter the code:", grant.verification_uri)?;
    writeln!(writer)?;
    writeln!(writer, "    {}", grant.user_code)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Waiting for authorisation (expires in {} minutes, Ctrl-C to cancel)...",
        grant.expires_in.div_ceil(60)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use revwatch::github::models::test_support::{authored_pull_request, review_request};
    use revwatch::{CheckError, CheckErrorKind, PrCheckResult, ReviewState};
    use rstest::rstest;

    use super::write_result_summary_to;

    fn render(result: &PrCheckResult) -> String {
        let mut buffer = Vec::new();
        write_result_summary_to(&mut buffer, result).expect("write should succeed");
        String::from_utf8(buffer).expect("output should be UTF-8")
    }

    #[rstest]
    fn summary_lists_each_section() {
        let checked_at = Utc
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");
        let mut result = PrCheckResult::failed(
            vec![
                CheckError::new(CheckErrorKind::Auth, "org requires SAML SSO")
                    .in_repository("org/repo")
                    .with_detail("https://github.com/orgs/org/sso"),
            ],
            checked_at,
        );
        result.active_pull_requests = vec![review_request(1, 101, "org/repo")];
        result.authored_pull_requests = vec![authored_pull_request(
            9,
            7,
            "org/repo",
            "me",
            &[("alice", ReviewState::Approved)],
        )];

        let output = render(&result);

        assert!(output.contains("Awaiting your review (1):"), "{output}");
        assert!(output.contains("[1] org/repo#101 Pull request #101 (@octocat)"), "{output}");
        assert!(output.contains("reviews: alice approved"), "{output}");
        assert!(output.contains("auth (org/repo): org requires SAML SSO"), "{output}");
        assert!(output.contains("https://github.com/orgs/org/sso"), "{output}");
        assert!(!output.contains("Dismissed"), "{output}");
        assert!(output.ends_with("Checked at 2026-01-02T03:04:05+00:00\n"), "{output}");
    }
}
