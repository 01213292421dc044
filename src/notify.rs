//! Review-request notifications and sinks.
//!
//! Delivery is fire-and-forget: a sink that fails to write drops the event.

use std::io;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::github::models::PullRequest;

/// A structured notification emitted after a check cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A pull request newly requests the user's review.
    ReviewRequested {
        /// Pull request identifier.
        id: u64,
        /// Repository full name.
        repository: String,
        /// Pull request number.
        number: u64,
        /// Pull request title.
        title: String,
        /// Author login.
        author: String,
        /// HTML URL.
        url: String,
    },
    /// Several review requests arrived in one cycle.
    Summary {
        /// Number of new review requests.
        count: usize,
    },
}

impl NotificationEvent {
    /// Builds the event for one pull request.
    #[must_use]
    pub fn review_requested(pull_request: &PullRequest) -> Self {
        Self::ReviewRequested {
            id: pull_request.id,
            repository: pull_request.repository.clone(),
            number: pull_request.number,
            title: pull_request.title.clone(),
            author: pull_request.author.clone(),
            url: pull_request.url.clone(),
        }
    }
}

/// A sink for review notifications.
pub trait Notifier: Send + Sync {
    /// Announces one newly requested review.
    fn notify_pull_request(&self, pull_request: &PullRequest);

    /// Announces that `count` review requests arrived together.
    fn notify_summary(&self, count: usize);
}

/// Notifier that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify_pull_request(&self, _pull_request: &PullRequest) {}

    fn notify_summary(&self, _count: usize) {}
}

/// Writes notifications to stdout as JSON lines (JSONL).
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    fn emit(event: &NotificationEvent) {
        let Ok(serialised) = serde_json::to_string(event) else {
            return;
        };

        let _ignored = writeln_stdout(&serialised);
    }
}

impl Notifier for ConsoleNotifier {
    fn notify_pull_request(&self, pull_request: &PullRequest) {
        Self::emit(&NotificationEvent::review_requested(pull_request));
    }

    fn notify_summary(&self, count: usize) {
        Self::emit(&NotificationEvent::Summary { count });
    }
}

fn writeln_stdout(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{message}")
}

/// Logs notifications through `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_pull_request(&self, pull_request: &PullRequest) {
        info!(
            repository = %pull_request.repository,
            number = pull_request.number,
            author = %pull_request.author,
            url = %pull_request.url,
            "review requested: {}",
            pull_request.title
        );
    }

    fn notify_summary(&self, count: usize) {
        info!(count, "{count} new review requests");
    }
}

/// Notifier that records events for assertions.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: std::sync::Mutex<Vec<NotificationEvent>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingNotifier {
    /// Drains the recorded events.
    #[must_use]
    pub fn take(&self) -> Vec<NotificationEvent> {
        self.events
            .lock()
            .map(|mut events| events.drain(..).collect())
            .unwrap_or_default()
    }

    fn push(&self, event: NotificationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Notifier for RecordingNotifier {
    fn notify_pull_request(&self, pull_request: &PullRequest) {
        self.push(NotificationEvent::review_requested(pull_request));
    }

    fn notify_summary(&self, count: usize) {
        self.push(NotificationEvent::Summary { count });
    }
}
