//! Tests for operation mode determination.

use rstest::rstest;

use crate::RevwatchConfig;
use crate::config::OperationMode;

#[rstest]
fn watch_when_no_mode_flags_set() {
    let config = RevwatchConfig {
        repositories: Some("org/a".to_owned()),
        ..Default::default()
    };

    assert_eq!(
        config.operation_mode(),
        OperationMode::Watch,
        "should watch when no mode flag is set"
    );
}

#[rstest]
#[case::login(RevwatchConfig { login: true, ..Default::default() }, OperationMode::Login)]
#[case::logout(RevwatchConfig { logout: true, ..Default::default() }, OperationMode::Logout)]
#[case::dismiss(RevwatchConfig { dismiss: Some(7), ..Default::default() }, OperationMode::Dismiss(7))]
#[case::restore(RevwatchConfig { restore: Some(7), ..Default::default() }, OperationMode::Restore(7))]
#[case::once(RevwatchConfig { once: true, ..Default::default() }, OperationMode::CheckOnce)]
fn single_flag_selects_its_mode(#[case] config: RevwatchConfig, #[case] expected: OperationMode) {
    assert_eq!(config.operation_mode(), expected);
}

#[rstest]
fn login_takes_precedence_over_everything() {
    let config = RevwatchConfig {
        login: true,
        logout: true,
        once: true,
        dismiss: Some(1),
        ..Default::default()
    };

    assert_eq!(config.operation_mode(), OperationMode::Login);
}

#[rstest]
fn dismissal_takes_precedence_over_once() {
    let config = RevwatchConfig {
        once: true,
        restore: Some(3),
        ..Default::default()
    };

    assert_eq!(
        config.operation_mode(),
        OperationMode::Restore(3),
        "offline dismissal commands should not trigger a network check"
    );
}

#[rstest]
fn notification_and_interval_settings_do_not_affect_mode() {
    let config = RevwatchConfig {
        no_notifications: true,
        check_interval_minutes: 30,
        ..Default::default()
    };

    assert_eq!(config.operation_mode(), OperationMode::Watch);
}
