//! Check cycle orchestration.
//!
//! [`ReviewChecker`] owns the collaborators for one configured user: it loads
//! the persisted identifier sets, fetches from GitHub, reconciles, writes the
//! state back, and sends notifications. A cycle never fails as a whole; every
//! problem ends up in [`PrCheckResult::errors`].

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::github::error::CheckError;
use crate::github::fetch::{FetchOutcome, fetch_reviews};
use crate::github::gateway::ReviewGateway;
use crate::github::locator::RepositorySlug;
use crate::notify::Notifier;
use crate::persistence::{PersistedState, PersistenceError, StateStore};
use crate::reconcile::{NotificationPlan, PrCheckResult, Reconciliation, TrackedIds, reconcile};
use crate::scheduler::CycleRunner;

/// Callback invoked with every completed cycle result.
pub type ResultCallback = Box<dyn Fn(&PrCheckResult) + Send + Sync>;

/// What to check and for whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerSettings {
    /// Repositories to check, in order.
    pub repositories: Vec<RepositorySlug>,
    /// Reviewer login; resolved from the credential when `None`.
    pub username: Option<String>,
    /// Whether to send notifications for new review requests.
    pub notifications: bool,
}

/// Runs check cycles and applies dismissals.
pub struct ReviewChecker {
    gateway: Arc<dyn ReviewGateway>,
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    settings: CheckerSettings,
    username: Mutex<Option<String>>,
    /// Held while a cycle or a dismissal writes its outcome.
    commit: tokio::sync::Mutex<()>,
    current: Mutex<Option<PrCheckResult>>,
    on_result: Option<ResultCallback>,
}

impl ReviewChecker {
    /// Creates a checker with no current result.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ReviewGateway>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        settings: CheckerSettings,
    ) -> Self {
        let username = Mutex::new(settings.username.clone());
        Self {
            gateway,
            store,
            notifier,
            settings,
            username,
            commit: tokio::sync::Mutex::new(()),
            current: Mutex::new(None),
            on_result: None,
        }
    }

    /// Registers a callback invoked after every cycle.
    #[must_use]
    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.on_result = Some(callback);
        self
    }

    /// The most recent result, if any cycle has run or a snapshot was
    /// restored.
    #[must_use]
    pub fn current_result(&self) -> Option<PrCheckResult> {
        self.current.lock().ok().and_then(|current| current.clone())
    }

    /// Loads the last persisted result as the current result.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be read.
    pub async fn restore_last_result(&self) -> Result<Option<PrCheckResult>, PersistenceError> {
        let store = Arc::clone(&self.store);
        let restored = run_blocking(move || store.last_result()).await?;
        self.replace_current(restored.clone());
        Ok(restored)
    }

    /// Runs one full check cycle.
    pub async fn run_cycle(&self) -> PrCheckResult {
        let result = match self.try_cycle().await {
            Ok(result) => result,
            Err(error) => {
                warn!(kind = error.kind.as_str(), message = %error.message, "check cycle failed");
                let result = PrCheckResult::failed(vec![error], Utc::now());
                self.persist_errors(&result).await;
                self.replace_current(Some(result.clone()));
                result
            }
        };

        info!(
            active = result.active_pull_requests.len(),
            dismissed = result.dismissed_pull_requests.len(),
            authored = result.authored_pull_requests.len(),
            errors = result.errors.len(),
            "check cycle complete"
        );
        if let Some(callback) = &self.on_result {
            callback(&result);
        }
        result
    }

    async fn try_cycle(&self) -> Result<PrCheckResult, CheckError> {
        // Fail before spending any requests when the state is unreadable.
        let readable = Arc::clone(&self.store);
        run_blocking(move || readable.load())
            .await
            .map_err(|error| CheckError::unknown(format!("could not load state: {error}")))?;

        let username = self.resolve_username().await?;
        let fetched =
            fetch_reviews(self.gateway.as_ref(), &self.settings.repositories, &username).await;

        let _commit = self.commit.lock().await;
        let store = Arc::clone(&self.store);
        let notifications = self.settings.notifications;
        let Reconciliation {
            result,
            notifications: plan,
            ..
        } = run_blocking(move || Ok(commit_cycle(store.as_ref(), fetched, notifications)))
            .await
            .map_err(|error| CheckError::unknown(format!("could not save state: {error}")))??;
        self.replace_current(Some(result.clone()));
        self.send(&plan);
        Ok(result)
    }

    async fn resolve_username(&self) -> Result<String, CheckError> {
        if let Some(username) = self.username.lock().ok().and_then(|name| name.clone()) {
            return Ok(username);
        }
        let user = self.gateway.authenticated_user().await?;
        info!(login = %user.login, "resolved reviewer from credential");
        if let Ok(mut cached) = self.username.lock() {
            *cached = Some(user.login.clone());
        }
        Ok(user.login)
    }

    async fn persist_errors(&self, result: &PrCheckResult) {
        let store = Arc::clone(&self.store);
        let errors = result.errors.clone();
        let outcome = run_blocking(move || store.set_last_errors(errors)).await;
        if let Err(error) = outcome {
            warn!(%error, "could not persist cycle errors");
        }
    }

    fn send(&self, plan: &NotificationPlan) {
        for pull_request in &plan.pull_requests {
            self.notifier.notify_pull_request(pull_request);
        }
        if let Some(count) = plan.summary_count {
            self.notifier.notify_summary(count);
        }
    }

    /// Moves pull request `id` from the active to the dismissed list and
    /// persists the dismissal.
    ///
    /// Returns `Ok(false)` without persisting when `id` is not active.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the dismissal cannot be saved; the
    /// in-memory change is kept.
    pub async fn dismiss(&self, id: u64) -> Result<bool, PersistenceError> {
        self.toggle_dismissal(id, Dismissal::Dismiss).await
    }

    /// Moves pull request `id` from the dismissed back to the active list and
    /// persists the change.
    ///
    /// Returns `Ok(false)` without persisting when `id` is not dismissed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the change cannot be saved; the
    /// in-memory change is kept.
    pub async fn undismiss(&self, id: u64) -> Result<bool, PersistenceError> {
        self.toggle_dismissal(id, Dismissal::Restore).await
    }

    async fn toggle_dismissal(&self, id: u64, action: Dismissal) -> Result<bool, PersistenceError> {
        let _commit = self.commit.lock().await;
        {
            let mut current = self
                .current
                .lock()
                .map_err(|_| PersistenceError::LockPoisoned)?;
            let Some(result) = current.as_mut() else {
                return Ok(false);
            };
            if !action.apply(result, id) {
                return Ok(false);
            }
        }

        let store = Arc::clone(&self.store);
        run_blocking(move || {
            store.update(&mut |state: &mut PersistedState| {
                action.record(&mut state.dismissed_ids, id);
                let snapshot_updated = state
                    .last_result
                    .as_mut()
                    .is_some_and(|result| action.apply(result, id));
                debug!(id, snapshot_updated, "recorded dismissal change");
            })
        })
        .await?;
        info!(id, action = action.as_str(), "updated dismissal");
        Ok(true)
    }

    fn replace_current(&self, result: Option<PrCheckResult>) {
        if let Ok(mut current) = self.current.lock() {
            *current = result;
        }
    }
}

#[async_trait]
impl CycleRunner for ReviewChecker {
    async fn run_cycle(&self) -> PrCheckResult {
        Self::run_cycle(self).await
    }
}

/// Reconciles `fetched` against the identifier sets read under the store's
/// lock and writes the outcome back in the same update, so dismissals made
/// while the fetch ran are kept.
///
/// A failed write keeps the reconciliation and records the failure in its
/// result.
fn commit_cycle(
    store: &dyn StateStore,
    fetched: FetchOutcome,
    notifications: bool,
) -> Result<Reconciliation, CheckError> {
    let mut pending = Some(fetched);
    let mut outcome: Option<Reconciliation> = None;
    let saved = store.update(&mut |state: &mut PersistedState| {
        let Some(found) = pending.take() else {
            return;
        };
        let tracked = TrackedIds {
            dismissed_ids: state.dismissed_ids.clone(),
            notified_ids: state.notified_ids.clone(),
        };
        let reconciliation = reconcile(found, &tracked, notifications, Utc::now());
        state
            .dismissed_ids
            .clone_from(&reconciliation.tracked.dismissed_ids);
        state
            .notified_ids
            .clone_from(&reconciliation.tracked.notified_ids);
        state.last_errors.clone_from(&reconciliation.result.errors);
        state.last_result = Some(reconciliation.result.clone());
        outcome = Some(reconciliation);
    });

    match (saved, outcome) {
        (Ok(_), Some(reconciliation)) => Ok(reconciliation),
        (Err(error), Some(mut reconciliation)) => {
            warn!(%error, "could not persist check result");
            reconciliation
                .result
                .errors
                .push(CheckError::unknown(format!("could not save state: {error}")));
            Ok(reconciliation)
        }
        (Err(error), None) => Err(CheckError::unknown(format!(
            "could not load state: {error}"
        ))),
        (Ok(_), None) => Err(CheckError::unknown("state update was not applied")),
    }
}

/// Dismisses or restores `id` in the persisted snapshot without any network
/// access.
///
/// Returns `Ok(false)` when there is no snapshot or `id` is not in the
/// expected list.
///
/// # Errors
///
/// Returns [`PersistenceError`] when the store cannot be read or written.
pub fn apply_stored_dismissal(
    store: &dyn StateStore,
    id: u64,
    dismiss: bool,
) -> Result<bool, PersistenceError> {
    let action = if dismiss {
        Dismissal::Dismiss
    } else {
        Dismissal::Restore
    };
    let mut changed = false;
    store.update(&mut |state: &mut PersistedState| {
        let Some(result) = state.last_result.as_mut() else {
            return;
        };
        changed = action.apply(result, id);
        if changed {
            action.record(&mut state.dismissed_ids, id);
        }
    })?;
    Ok(changed)
}

#[derive(Debug, Clone, Copy)]
enum Dismissal {
    Dismiss,
    Restore,
}

impl Dismissal {
    fn apply(self, result: &mut PrCheckResult, id: u64) -> bool {
        match self {
            Self::Dismiss => result.dismiss(id),
            Self::Restore => result.undismiss(id),
        }
    }

    fn record(self, dismissed_ids: &mut std::collections::BTreeSet<u64>, id: u64) {
        match self {
            Self::Dismiss => {
                dismissed_ids.insert(id);
            }
            Self::Restore => {
                dismissed_ids.remove(&id);
            }
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Dismiss => "dismiss",
            Self::Restore => "restore",
        }
    }
}

async fn run_blocking<T, F>(operation: F) -> Result<T, PersistenceError>
where
    F: FnOnce() -> Result<T, PersistenceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|error| PersistenceError::TaskFailed {
            message: error.to_string(),
        })?
}
