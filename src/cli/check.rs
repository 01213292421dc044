//! One-off checks and the scheduled watch loop.

use std::io::{self, Write};
use std::sync::Arc;

use revwatch::auth::FileSecretStore;
use revwatch::notify::{ConsoleNotifier, NoopNotifier, Notifier, TracingNotifier};
use revwatch::persistence::JsonFileStateStore;
use revwatch::{
    CheckInterval, OctocrabReviewGateway, PrCheckResult, ReviewChecker, RevwatchConfig,
    RevwatchError, Scheduler,
};
use tracing::{debug, info, warn};

use super::output::write_result_summary_to;

fn build_checker(
    config: &RevwatchConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<ReviewChecker, RevwatchError> {
    let settings = config.checker_settings()?;
    let state_dir = config.state_dir_path()?;
    let secrets = FileSecretStore::open(&state_dir)?;
    let (token, source) = config.resolve_token(&secrets)?;
    debug!(?source, "resolved GitHub token");

    let gateway = OctocrabReviewGateway::for_token(&token, &config.api_base_url()?)?;
    let store = JsonFileStateStore::open(&state_dir)?;
    let notifier = notifier_for(config, notifier);
    Ok(ReviewChecker::new(
        Arc::new(gateway),
        Arc::new(store),
        notifier,
        settings,
    ))
}

/// Swaps in a notifier that drops every event when notifications are off.
fn notifier_for(config: &RevwatchConfig, enabled: Arc<dyn Notifier>) -> Arc<dyn Notifier> {
    if config.no_notifications {
        Arc::new(NoopNotifier)
    } else {
        enabled
    }
}

/// Runs one check cycle and prints the result.
///
/// Notifications go to the log so stdout holds only the summary.
///
/// # Errors
///
/// Returns [`RevwatchError::CheckFailed`] when the cycle recorded errors,
/// after the summary is printed.
pub async fn once(config: &RevwatchConfig) -> Result<(), RevwatchError> {
    let checker = build_checker(config, Arc::new(TracingNotifier))?;
    let result = checker.run_cycle().await;

    write_result_summary_to(&mut io::stdout().lock(), &result)?;
    if result.has_errors() {
        return Err(RevwatchError::CheckFailed {
            count: result.errors.len(),
        });
    }
    Ok(())
}

/// Checks on a schedule until Ctrl-C, writing notifications to stdout as
/// JSON lines.
///
/// # Errors
///
/// Returns configuration, credential, or client construction errors, or
/// [`RevwatchError::Io`] when the interrupt handler cannot be installed.
pub async fn watch(config: &RevwatchConfig) -> Result<(), RevwatchError> {
    let checker = build_checker(config, Arc::new(ConsoleNotifier))?
        .with_result_callback(Box::new(report_remediation));
    if let Err(error) = checker.restore_last_result().await {
        warn!(%error, "could not restore the last check result");
    }

    let scheduler = Scheduler::new(
        Arc::new(checker),
        CheckInterval::from_minutes(config.check_interval_minutes),
    );
    scheduler.start();
    info!(
        minutes = scheduler.interval().minutes(),
        "watching for review requests"
    );

    let interrupted = tokio::signal::ctrl_c().await;
    info!("stopping");
    scheduler.stop().await;
    interrupted?;
    Ok(())
}

fn report_remediation(result: &PrCheckResult) {
    for error in &result.errors {
        if let Some(detail) = &error.detail {
            warn!(
                kind = error.kind.as_str(),
                repository = error.repository.as_deref().unwrap_or("-"),
                "{}: {detail}",
                error.message
            );
        }
    }
    if result.has_errors() {
        let _ignored = writeln!(
            io::stderr().lock(),
            "{} error(s) in the last check; run with --once for details",
            result.errors.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use revwatch::RevwatchConfig;
    use revwatch::notify::{Notifier, RecordingNotifier};
    use rstest::rstest;

    use super::notifier_for;

    #[rstest]
    #[case::enabled(false, 1)]
    #[case::disabled(true, 0)]
    fn notifier_follows_the_notification_switch(
        #[case] no_notifications: bool,
        #[case] expected: usize,
    ) {
        let recording = Arc::new(RecordingNotifier::default());
        let config = RevwatchConfig {
            no_notifications,
            ..RevwatchConfig::default()
        };

        let notifier = notifier_for(&config, Arc::clone(&recording) as Arc<dyn Notifier>);
        notifier.notify_summary(2);

        assert_eq!(recording.take().len(), expected);
    }
}
