//! Scenario state for check cycle BDD tests.

use std::sync::Arc;

use camino::Utf8PathBuf;
use revwatch::PrCheckResult;
use revwatch::notify::RecordingNotifier;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use tempfile::TempDir;
use wiremock::MockServer;

use super::runtime::SharedRuntime;

/// State shared across steps in a check cycle scenario.
#[derive(ScenarioState, Default)]
pub(crate) struct CycleState {
    /// Runtime driving async gateway calls.
    pub(crate) runtime: Slot<SharedRuntime>,
    /// Mock GitHub REST API.
    pub(crate) server: Slot<MockServer>,
    /// Directory holding `state.json`.
    pub(crate) state_dir: Slot<TempDir>,
    /// Repositories configured for the checker.
    pub(crate) repositories: Slot<Vec<String>>,
    /// Notifier shared by every cycle in the scenario.
    pub(crate) notifier: Slot<Arc<RecordingNotifier>>,
    /// Result of the latest cycle.
    pub(crate) result: Slot<PrCheckResult>,
}

impl CycleState {
    /// Adds `repository` to the configured list.
    pub(crate) fn watch(&self, repository: &str) {
        let mut repositories = self.repositories.get().unwrap_or_default();
        repositories.push(repository.to_owned());
        self.repositories.set(repositories);
    }

    /// Returns the UTF-8 path of the state directory, creating it on first
    /// use.
    pub(crate) fn state_dir_path(&self) -> Utf8PathBuf {
        if self.state_dir.with_ref(|_| ()).is_none() {
            self.state_dir
                .set(TempDir::new().unwrap_or_else(|error| panic!("temp dir: {error}")));
        }
        self.state_dir
            .with_ref(|dir| Utf8PathBuf::from_path_buf(dir.path().join("state")))
            .unwrap_or_else(|| panic!("state directory not initialised"))
            .unwrap_or_else(|path| panic!("non UTF-8 temp path {}", path.display()))
    }

    /// Returns the scenario notifier, creating it on first use.
    pub(crate) fn notifier(&self) -> Arc<RecordingNotifier> {
        if let Some(notifier) = self.notifier.get() {
            return notifier;
        }
        let notifier = Arc::new(RecordingNotifier::default());
        self.notifier.set(Arc::clone(&notifier));
        notifier
    }
}

/// Parses a comma-separated id list; `none` is the empty list.
pub(crate) fn parse_ids(text: &str) -> Vec<u64> {
    if text.trim() == "none" {
        return Vec::new();
    }
    text.split(',')
        .map(|value| {
            value
                .trim()
                .parse()
                .unwrap_or_else(|_| panic!("invalid id `{value}`"))
        })
        .collect()
}
